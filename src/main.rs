use std::env;

#[tokio::main]
async fn main() {
    env_logger::init();

    let raw_args: Vec<String> = env::args().collect();
    match raw_args.get(1).map(|s| s.as_str()) {
        Some("serve") => {
            let port = raw_args
                .get(2)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8080);
            if let Err(e) = rent_vs_invest::api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Some("evaluate") => {
            let cli_args = std::iter::once(raw_args[0].clone()).chain(raw_args[2..].iter().cloned());
            match rent_vs_invest::api::run_cli(cli_args) {
                Ok(output) => println!("{}", output.trim_end()),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
        _ => {
            eprintln!("Usage: rent-vs-invest serve [port] | rent-vs-invest evaluate [flags]");
            std::process::exit(1);
        }
    }
}
