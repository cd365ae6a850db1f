use std::io::BufRead;

use herald::{uuid::Uuid, Advertisement, Advertiser, Session};

#[pollster::main]
async fn main() -> herald::Result<()> {
    env_logger::builder()
        .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Debug)
        .init();

    let local_name = std::env::args().nth(1).unwrap_or_else(|| "herald".to_string());
    let service_uuid = random_uuid();

    let session = Session::new().await?;
    let mut advertiser = Advertiser::new(&session);

    if let Err(e) = advertiser
        .start(Advertisement {
            local_name: local_name.clone(),
            service_uuid,
        })
        .await
    {
        eprintln!("error: {}", e);
        if let Some(hint) = e.remediation() {
            eprintln!("hint: {}", hint);
        }
        std::process::exit(1);
    }

    println!("advertising as '{}' with service {}", local_name, service_uuid);
    println!("press enter to stop");

    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);

    advertiser.stop().await?;
    println!("advertisement stopped");

    Ok(())
}

/// Generates a random version-4 UUID for the advertised service.
fn random_uuid() -> Uuid {
    let mut bytes: [u8; 16] = rand::random();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes)
}
