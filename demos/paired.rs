use herald::{Adapter, Session};

#[pollster::main]
async fn main() -> herald::Result<()> {
    env_logger::builder()
        .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Debug)
        .init();

    let session = Session::new().await?;
    let adapter = Adapter::locate(&session).await?;

    for device in adapter.paired_devices().await? {
        let name = device.name.as_deref().unwrap_or("<unnamed>");
        let state = if device.connected {
            "connected"
        } else {
            "disconnected"
        };
        match device.rssi {
            Some(rssi) => println!("{} [{}] ({}, {} dBm)", device.address, name, state, rssi),
            None => println!("{} [{}] ({})", device.address, name, state),
        }
    }

    Ok(())
}
