use molbridge::service::Endpoint;
use molbridge::toolkits::registry;

use crate::error::Result;

pub fn run() -> Result<()> {
    for name in registry::names() {
        println!("{name}");
    }
    Ok(())
}

pub fn list_endpoints() -> Result<()> {
    for endpoint in Endpoint::ALL {
        println!("{}", endpoint.name());
    }
    Ok(())
}
