use anyhow::Result;
use kotto_agent::{Arguments, CapabilityRegistry, Signal};

pub fn registry(_args: &[String]) -> Result<CapabilityRegistry> {
    let registry = CapabilityRegistry::builder()
        .method("HelloWorld", "cheer", |args: Arguments| async move {
            let (message,): (String,) = args.parse()?;
            Err::<(), _>(Signal::exit(message))
        })
        .build()?;
    Ok(registry)
}
