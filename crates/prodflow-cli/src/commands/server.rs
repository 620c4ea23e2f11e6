use anyhow::Result;
use colored::Colorize;
use prodflow_client::ApiClient;

pub async fn status(client: &ApiClient) -> Result<()> {
    let server = client.base_url().as_str();
    let (code, body) = client.ping().await?;
    if (200..300).contains(&code) {
        println!("{} {} is {}", "✓".green(), server.cyan(), "reachable".green());
        if !body.is_empty() {
            println!("  {body}");
        }
    } else {
        anyhow::bail!("{server} returned {code} {body}");
    }
    Ok(())
}
