use std::{process, time::Duration};

use herald::{address::Address, device::Device, Adapter, Session};

const PAIR_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[pollster::main]
async fn main() -> herald::Result<()> {
    env_logger::builder()
        .filter_module(env!("CARGO_PKG_NAME"), log::LevelFilter::Debug)
        .init();

    let Some(arg) = std::env::args().nth(1) else {
        eprintln!("usage: connect <device-address>");
        process::exit(2);
    };
    let address: Address = match arg.parse() {
        Ok(address) => address,
        Err(e) => {
            eprintln!("error: '{}': {}", arg, e);
            process::exit(2);
        }
    };

    let session = Session::new().await?;
    let adapter = Adapter::locate(&session).await?;
    let device = Device::open(&session, &adapter, address).await?;

    device.pair(PAIR_TIMEOUT).await?;
    device.connect(CONNECT_TIMEOUT).await?;
    println!("connected to {}", address);

    Ok(())
}
