use std::{env, fs::File};

use bytelens_class_file::{AttributeBody, Attributes, ClassFile, ClassFileError};
use memmap::Mmap;

fn main() {
    pretty_env_logger::init();

    let mut failures = 0;
    for path in env::args().skip(1) {
        if let Err(err) = dump(&path) {
            log::error!("{}: {}", path, err);
            failures += 1;
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
}

fn dump(path: &str) -> Result<(), ClassFileError> {
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    let class_file = ClassFile::parse(&mmap)?;

    println!(
        "{} ({}.{})",
        class_file.class_name()?,
        class_file.version.0,
        class_file.version.1
    );
    print_attributes(&class_file.attributes, 1);

    for field in &class_file.fields {
        println!(
            "  field {} {}",
            class_file.field_name(field)?,
            class_file.field_descriptor(field)?
        );
        print_attributes(&field.attributes, 2);
    }

    for method in &class_file.methods {
        println!(
            "  method {}{}",
            class_file.method_name(method)?,
            class_file.method_descriptor(method)?
        );
        print_attributes(&method.attributes, 2);
    }

    Ok(())
}

fn print_attributes(attributes: &Attributes, depth: usize) {
    for attribute in attributes {
        let range = attribute.range();
        println!(
            "{:indent$}{} [{}] {}..{}",
            "",
            attribute.name,
            attribute.body.kind(),
            range.start,
            range.end,
            indent = depth * 2
        );
        if let AttributeBody::Code(code) = &attribute.body {
            print_attributes(&code.attributes, depth + 1);
        }
    }
}
