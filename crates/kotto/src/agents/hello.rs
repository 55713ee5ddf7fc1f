use anyhow::Result;
use kotto_agent::{Arguments, CapabilityRegistry, Signal};

const CLASS: &str = "Hello";

pub fn registry(_args: &[String]) -> Result<CapabilityRegistry> {
    let registry = CapabilityRegistry::builder()
        .method(CLASS, "positivity", |args: Arguments| async move {
            let (message,): (String,) = args.parse()?;
            Err::<(), _>(Signal::exit(message))
        })
        .build()?;
    Ok(registry)
}
