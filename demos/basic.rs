//! Basic example: box an integer in the JVM and read it back.
//!
//! Run with: cargo run --example basic
//!
//! Needs a VM installed with `JavaVm::install`, typically from `JNI_OnLoad`
//! inside a library loaded by Java. Run standalone, it reports that no VM
//! is installed.

use jbridge::{ContextOptions, ExceptionPolicy, ObjectHandle};

fn main() {
    println!("Minimum JNI version: {:#x}", jbridge::version::MIN_JNI_VERSION);

    let options = ContextOptions {
        exception_policy: ExceptionPolicy::DescribeAndConvert,
        ..ContextOptions::default()
    };

    let result = jbridge::with_env(options, |env| {
        let integer = env.find_class("java.lang.Integer")?;
        println!("Found class: {}", integer.name()?);

        let boxed: ObjectHandle = integer.create_object((42i32,))?;
        let value: i32 = boxed.invoke("intValue", ())?;
        let text: String = boxed.invoke("toString", ())?;
        Ok((value, text))
    });

    match result {
        Ok((value, text)) => {
            println!("Integer(42).intValue() = {}", value);
            println!("Integer(42).toString() = {:?}", text);
        }
        Err(jbridge::Error::VmNotInstalled) => {
            println!("No VM installed - load this code from Java to run it");
        }
        Err(e) => {
            println!("Call failed: {}", e);
        }
    }
}
