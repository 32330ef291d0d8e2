use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "coupon-ledger")]
#[command(about = "Coupon balance ledger over HTTP, one JSON file per coupon", long_about = None)]
#[command(version = env!("COUPON_LEDGER_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// JSON config file (defaults are used for keys it leaves out)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the coupon files
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Address to listen on, e.g. 127.0.0.1:8080
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Remove leftovers of interrupted writes and report unreadable records
    Doctor,

    /// Print one stored coupon as JSON
    Show {
        /// The coupon id (idcoupon)
        id: String,
    },
}
