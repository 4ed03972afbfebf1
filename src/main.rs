//! # Prodibot — FAQ chatbot service for an academic department website
//!
//! Usage:
//!   prodibot serve                  # Start the HTTP gateway
//!   prodibot seed                   # Load a starter knowledge base
//!   prodibot kb list                # Print the knowledge entries
//!
//! Configuration lives at ~/.prodibot/config.toml; every value has a
//! working default.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use prodibot_core::types::Category;
use prodibot_core::ProdibotConfig;
use prodibot_store::ChatStore;

#[derive(Parser)]
#[command(name = "prodibot", version, about = "FAQ chatbot service for an academic department website")]
struct Cli {
    /// Config file path (default: ~/.prodibot/config.toml)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP gateway (default)
    Serve {
        /// Override the listen port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Load a starter knowledge base and quick replies
    Seed,
    /// Knowledge-base inspection
    Kb {
        #[command(subcommand)]
        command: KbCommand,
    },
}

#[derive(Subcommand)]
enum KbCommand {
    /// Print all entries in matcher order
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "prodibot=debug,tower_http=debug"
    } else {
        "prodibot=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => ProdibotConfig::load_from(path)?,
        None => ProdibotConfig::load()?,
    };

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.gateway.port = port;
            }
            prodibot_gateway::start(&config).await?;
        }
        Command::Seed => {
            let store = ChatStore::open(&config.database.resolved_path())?;
            seed(&store)?;
            tracing::info!("Seeded knowledge base: {} entries", store.knowledge_count());
        }
        Command::Kb { command: KbCommand::List } => {
            let store = ChatStore::open(&config.database.resolved_path())?;
            for entry in store.list_knowledge()? {
                println!(
                    "#{:<4} [{:<11}] prio={:<3} active={} {}",
                    entry.id,
                    entry.category.as_str(),
                    entry.priority,
                    if entry.active { "y" } else { "n" },
                    entry.question
                );
            }
        }
    }

    Ok(())
}

/// Starter content for a fresh deployment: the FAQ topics a department
/// website actually gets asked about, plus the widget's quick replies.
fn seed(store: &ChatStore) -> Result<()> {
    if store.knowledge_count() > 0 {
        tracing::warn!("Knowledge base is not empty, seeding anyway");
    }

    let entries: [(Category, &str, &str, &str, Option<&str>, i32); 6] = [
        (
            Category::Pendaftaran,
            "bagaimana cara mendaftar sebagai mahasiswa baru",
            "pendaftaran, daftar, mahasiswa baru, admisi",
            "Pendaftaran mahasiswa baru dibuka setiap Juni melalui portal admisi universitas. \
             Siapkan ijazah, transkrip nilai, dan pas foto.",
            Some("https://prodi.example.ac.id/pendaftaran"),
            5,
        ),
        (
            Category::Kurikulum,
            "apa saja mata kuliah dalam kurikulum",
            "kurikulum, mata kuliah, sks",
            "Kurikulum terdiri dari 144 SKS yang ditempuh dalam 8 semester. Daftar lengkap \
             mata kuliah ada di halaman Kurikulum.",
            Some("https://prodi.example.ac.id/kurikulum"),
            3,
        ),
        (
            Category::Akademik,
            "kapan jadwal kuliah semester ini",
            "jadwal, jadwal kuliah, kalender akademik",
            "Jadwal kuliah dan kalender akademik semester berjalan dapat dilihat di halaman Jadwal.",
            Some("https://prodi.example.ac.id/jadwal"),
            3,
        ),
        (
            Category::Beasiswa,
            "beasiswa apa saja yang tersedia",
            "beasiswa, keringanan biaya, kip",
            "Tersedia beasiswa prestasi akademik, KIP Kuliah, dan beasiswa kerja sama industri. \
             Pengumuman dibuka tiap awal semester.",
            None,
            2,
        ),
        (
            Category::Karir,
            "bagaimana prospek karir lulusan",
            "karir, kerja, lulusan, alumni",
            "Lulusan bekerja sebagai software engineer, data analyst, dan peneliti; sebagian \
             melanjutkan studi pascasarjana.",
            None,
            1,
        ),
        (
            Category::Kontak,
            "bagaimana cara menghubungi program studi",
            "kontak, telepon, email, alamat",
            "Sekretariat prodi buka Senin-Jumat 08.00-16.00, email prodi@universitas.ac.id.",
            Some("https://prodi.example.ac.id/kontak"),
            2,
        ),
    ];
    for (category, question, keywords, answer, link, priority) in entries {
        store.insert_knowledge(category, question, keywords, answer, link, priority)?;
    }

    for (position, label) in ["Informasi pendaftaran", "Informasi kurikulum", "Jadwal kuliah", "Kontak"]
        .into_iter()
        .enumerate()
    {
        store.insert_quick_reply(label, position as i32)?;
    }

    Ok(())
}
