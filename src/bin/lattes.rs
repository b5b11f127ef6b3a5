use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    match lattes::cli::main().await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
