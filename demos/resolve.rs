//! Resolve an adapter (and optionally a device) on the system bus.
//!
//! ```text
//! cargo run --example resolve -- [ADAPTER] [DEVICE_ADDRESS]
//! ```
//!
//! Set `LOOKUP=path` to use exact `/org/bluez/<ADAPTER>` lookup instead of
//! address/suffix matching.

use std::env;

#[cfg(target_os = "linux")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use bluez_locate::bluez::DbusTransport;
    use bluez_locate::resolver::{AdapterResolver, LookupPolicy, ResolverConfig};

    pretty_env_logger::init();

    let mut args = env::args().skip(1);
    let adapter_selector = args.next();
    let device_address = args.next();

    let policy = match env::var("LOOKUP").as_deref() {
        Ok("path") => LookupPolicy::PathConstruction,
        _ => LookupPolicy::Pattern,
    };

    let transport = DbusTransport::system(Default::default())?;
    let resolver = AdapterResolver::with_config(transport, ResolverConfig { policy });

    let adapter = resolver.find_adapter(adapter_selector.as_deref()).await?;
    let address = adapter.address(resolver.transport()).await?;
    println!(
        "adapter {} ({})",
        adapter,
        address.as_deref().unwrap_or("no address")
    );

    match device_address {
        Some(address) => {
            let device = resolver
                .find_device(&address, adapter_selector.as_deref())
                .await?;
            println!("device {}", device);
        }
        None => {
            for device in resolver.devices(&adapter).await? {
                println!(
                    "  {} {} paired={} connected={}",
                    device.address,
                    device.alias.as_deref().unwrap_or("-"),
                    device.paired,
                    device.connected
                );
            }
        }
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!(
        "{} needs BlueZ on Linux",
        env::args().next().unwrap_or_default()
    );
}
