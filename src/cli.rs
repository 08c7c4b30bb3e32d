use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "balance-tracker-rs",
    version,
    about = "Account balance history query server"
)]
pub struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
    #[arg(long, default_value_t = false)]
    pub print_openapi: bool,
}

impl Args {
    /// `host:port`, bracketing bare IPv6 hosts.
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
