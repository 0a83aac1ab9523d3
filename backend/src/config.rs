// Service configuration, read from flags or the environment
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(clap::Parser, Debug, Clone)]
#[command(name = "bowtie-backend", about = "Bowtie risk diagram service")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "BOWTIE_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Directory holding `<name>.json` diagrams
    #[arg(long, env = "BOWTIE_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Origin allowed to call the API from a browser
    #[arg(long, env = "BOWTIE_CORS_ORIGIN", default_value = "http://localhost:5173")]
    pub cors_origin: String,

    /// URL of the diagram editor, handed to clients that embed it
    #[arg(long, env = "BOWTIE_FRONTEND_URL", default_value = "http://localhost:5173")]
    pub frontend_url: String,

    /// Log filter (trace, debug, info, warn, error)
    #[arg(long, env = "BOWTIE_LOG", default_value = "info")]
    pub log_level: String,
}
