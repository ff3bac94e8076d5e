use classasm::jvm::class_file::{ClassBuilder, Code, SourceFile};
use classasm::jvm::code::{Instruction, InstructionStream, InvokeType};
use classasm::jvm::{ClassAccessFlags, Constant, MethodAccessFlags, Version};
use classasm::reader::{
    decode_instructions, AttributeData, AttributeInfo, ClassFile, ConstantPool, ReadError,
};

use clap::{crate_version, value_parser, Arg, ArgAction, Command};
use std::fmt;
use std::fs;
use std::io;

#[derive(Debug)]
enum CliError {
    Assemble(classasm::Error),
    Read(ReadError),
    Io(io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CliError::Assemble(err) => write!(f, "failed to assemble class: {}", err),
            CliError::Read(err) => write!(f, "failed to read class: {}", err),
            CliError::Io(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CliError {}

impl From<classasm::Error> for CliError {
    fn from(err: classasm::Error) -> CliError {
        CliError::Assemble(err)
    }
}

impl From<ReadError> for CliError {
    fn from(err: ReadError) -> CliError {
        CliError::Read(err)
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> CliError {
        CliError::Io(err)
    }
}

fn main() -> Result<(), CliError> {
    env_logger::init();

    let matches = Command::new("classasm")
        .version(crate_version!())
        .about("Assemble and inspect JVM class files")
        .subcommand_required(true)
        .subcommand(
            Command::new("dump")
                .about("Print the contents of a class file")
                .arg(
                    Arg::new("FILE")
                        .help("Class file to read")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("hello")
                .about("Assemble a class whose `main` prints `Hello, world!`")
                .arg(
                    Arg::new("class")
                        .long("class")
                        .value_name("CLASS_NAME")
                        .required(true)
                        .action(ArgAction::Set)
                        .help("Output class name (eg. `foo/bar/Baz`)"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_name("PATH")
                        .action(ArgAction::Set)
                        .help("Where to write the class (defaults to `<CLASS_NAME>.class`)"),
                )
                .arg(
                    Arg::new("major")
                        .long("major")
                        .value_parser(value_parser!(u16))
                        .default_value("52")
                        .help("Major class file version"),
                )
                .arg(
                    Arg::new("minor")
                        .long("minor")
                        .value_parser(value_parser!(u16))
                        .default_value("0")
                        .help("Minor class file version"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("dump", matches)) => {
            let path = matches.get_one::<String>("FILE").map_or("", String::as_str);
            log::info!("Reading '{}'", path);
            let bytes = fs::read(path)?;
            let class = ClassFile::parse(&bytes)?;
            dump(&class)?;
        }
        Some(("hello", matches)) => {
            let class_name = matches.get_one::<String>("class").map_or("", String::as_str);
            let version = Version::new(
                matches.get_one::<u16>("major").copied().unwrap_or(52),
                matches.get_one::<u16>("minor").copied().unwrap_or(0),
            );
            let output = matches
                .get_one::<String>("output")
                .cloned()
                .unwrap_or_else(|| format!("{}.class", class_name));

            let class = hello_world(class_name, version)?;
            log::info!("Writing '{}'", output);
            class.save_to_path(&output, true)?;
        }
        _ => unreachable!("a subcommand is required"),
    }

    Ok(())
}

/// Assemble a class with a default constructor and a `main` method printing a greeting
fn hello_world(class_name: &str, version: Version) -> Result<ClassBuilder, classasm::Error> {
    let mut class = ClassBuilder::new(
        version,
        ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
        class_name,
        Some("java/lang/Object"),
    )?;

    // Default constructor
    let object_init = class
        .constants
        .get_or_add_method_ref_named("java/lang/Object", "<init>", "()V")?;
    let mut code = InstructionStream::with_buffer(class.new_chain());
    code.emit(Instruction::ALoad(0))?;
    code.emit(Instruction::Invoke(InvokeType::Special, object_init.into()))?;
    code.emit(Instruction::Return)?;
    let code = class.attribute(Code {
        max_stack: 1,
        max_locals: 1,
        code: code.finish()?,
        exception_table: vec![],
        attributes: vec![],
    })?;
    class.add_method(MethodAccessFlags::PUBLIC, "<init>", "()V", vec![code])?;

    // `main`
    let out = class.constants.get_or_add_field_ref_named(
        "java/lang/System",
        "out",
        "Ljava/io/PrintStream;",
    )?;
    let greeting = class.constants.get_or_add_string_literal("Hello, world!")?;
    let println = class.constants.get_or_add_method_ref_named(
        "java/io/PrintStream",
        "println",
        "(Ljava/lang/String;)V",
    )?;
    let mut code = InstructionStream::with_buffer(class.new_chain());
    code.emit(Instruction::GetStatic(out))?;
    code.emit(Instruction::Ldc(greeting.into()))?;
    code.emit(Instruction::Invoke(InvokeType::Virtual, println.into()))?;
    code.emit(Instruction::Return)?;
    let code = class.attribute(Code {
        max_stack: 2,
        max_locals: 1,
        code: code.finish()?,
        exception_table: vec![],
        attributes: vec![],
    })?;
    class.add_method(
        MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        "main",
        "([Ljava/lang/String;)V",
        vec![code],
    )?;

    let simple_name = class_name.rsplit('/').next().unwrap_or(class_name);
    let source = class
        .constants
        .get_or_add_utf8(&format!("{}.java", simple_name))?;
    class.add_attribute(SourceFile(source))?;

    Ok(class)
}

fn dump(class: &ClassFile) -> Result<(), ReadError> {
    println!("class {}", class.this_class_name()?);
    if let Some(super_class) = class.super_class_name()? {
        println!("  extends {}", super_class);
    }
    for interface in class.interface_names()? {
        println!("  implements {}", interface);
    }
    println!(
        "  version: {}.{}",
        class.version.major_version, class.version.minor_version
    );
    println!("  flags: {:?}", class.access_flags);

    println!("Constant pool:");
    for (index, constant) in class.constants.iter() {
        println!("  #{:<4} = {}", index.0, describe_constant(&class.constants, constant));
    }

    println!("Fields:");
    for field in &class.fields {
        println!("  {} {} ({:?})", field.name, field.descriptor, field.access_flags);
        dump_attributes(&field.attributes, "    ")?;
    }

    println!("Methods:");
    for method in &class.methods {
        println!("  {}{} ({:?})", method.name, method.descriptor, method.access_flags);
        dump_attributes(&method.attributes, "    ")?;
    }

    println!("Attributes:");
    dump_attributes(&class.attributes, "  ")
}

fn dump_attributes(attributes: &[AttributeInfo], indent: &str) -> Result<(), ReadError> {
    for attribute in attributes {
        match &attribute.data {
            AttributeData::Code(code) => {
                println!(
                    "{}Code: stack={}, locals={}, {} bytes",
                    indent,
                    code.max_stack,
                    code.max_locals,
                    code.code.len()
                );
                for instruction in decode_instructions(&code.code)? {
                    println!("{}{}", indent, instruction);
                }
                for handler in &code.exception_table {
                    println!(
                        "{}  catch [{}, {}) -> {} ({:?})",
                        indent,
                        handler.start_pc,
                        handler.end_pc,
                        handler.handler_pc,
                        handler.catch_type.map(|index| (index.0).0)
                    );
                }
                dump_attributes(&code.attributes, &format!("{}  ", indent))?;
            }
            AttributeData::Unknown(bytes) => {
                println!("{}{} ({} bytes)", indent, attribute.name, bytes.len())
            }
            data => println!("{}{}: {:?}", indent, attribute.name, data),
        }
    }
    Ok(())
}

fn describe_constant(pool: &ConstantPool, constant: &Constant) -> String {
    let resolved = |result: Result<&str, ReadError>| match result {
        Ok(text) => text.to_owned(),
        Err(err) => format!("<{}>", err),
    };
    match constant {
        Constant::Utf8(text) => format!("Utf8 {:?}", text),
        Constant::Integer(value) => format!("Integer {}", value),
        Constant::Float(value) => format!("Float {:?}", value),
        Constant::Long(value) => format!("Long {}", value),
        Constant::Double(value) => format!("Double {:?}", value),
        Constant::Class(name) => format!("Class {}", resolved(pool.utf8((name.0).0))),
        Constant::String(text) => format!("String {:?}", resolved(pool.utf8((text.0).0))),
        Constant::FieldRef { class, name_and_type }
        | Constant::MethodRef { class, name_and_type }
        | Constant::InterfaceMethodRef { class, name_and_type } => {
            let kind = match constant {
                Constant::FieldRef { .. } => "Fieldref",
                Constant::MethodRef { .. } => "Methodref",
                _ => "InterfaceMethodref",
            };
            let (name, descriptor) = pool
                .name_and_type((name_and_type.0).0)
                .unwrap_or(("?", "?"));
            format!(
                "{} {}.{}:{}",
                kind,
                resolved(pool.class_name((class.0).0)),
                name,
                descriptor
            )
        }
        Constant::NameAndType { name, descriptor } => format!(
            "NameAndType {}:{}",
            resolved(pool.utf8((name.0).0)),
            resolved(pool.utf8((descriptor.0).0))
        ),
        Constant::MethodHandle {
            handle_kind,
            member,
        } => format!("MethodHandle {:?} #{}", handle_kind, member.0),
        Constant::MethodType { descriptor } => {
            format!("MethodType {}", resolved(pool.utf8((descriptor.0).0)))
        }
        Constant::Dynamic {
            bootstrap_method,
            name_and_type,
        } => format!("Dynamic #{}:#{}", bootstrap_method, (name_and_type.0).0),
        Constant::InvokeDynamic {
            bootstrap_method,
            name_and_type,
        } => format!("InvokeDynamic #{}:#{}", bootstrap_method, (name_and_type.0).0),
        Constant::Module(name) => format!("Module {}", resolved(pool.utf8((name.0).0))),
        Constant::Package(name) => format!("Package {}", resolved(pool.utf8((name.0).0))),
    }
}
