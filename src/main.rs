use rusk::{ImageBuilder, Loader, VERSION};

fn main() {
    println!("Rusk Bytecode Image Loader v{}", VERSION);

    // Build a small demo image
    let mut builder = ImageBuilder::new();
    let greeting = match builder.add_string("Hello, Rusk!") {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Failed to add constant: {}", e);
            return;
        }
    };
    let answer = builder.add_integer(42).expect("number table full");
    let pi = builder.add_float(3.14159).expect("number table full");

    // A made-up instruction stream referencing the constants by id
    builder.append_code(&[0x10, greeting, 0x11, answer, 0x11, pi, 0x01]);

    match builder.write_file("demo.rusk") {
        Ok(_) => println!("Created demo image file: demo.rusk"),
        Err(e) => {
            eprintln!("Failed to create demo image file: {}", e);
            return;
        }
    }

    // Load it back and dump the constant pool
    println!("\nLoading demo image...");
    let image = match Loader::load_file("demo.rusk") {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Load failed: {}", e);
            return;
        }
    };

    println!("Format version: {}", image.version());
    println!("Strings: {}", image.string_count());
    println!("Numbers: {}", image.number_count());
    println!("Instruction bytes: {}", image.instructions().len());

    for id in 0..image.string_count() as u8 {
        match image.string_by_id(id) {
            Ok(text) => println!("  string {}: {:?}", id, text),
            Err(e) => eprintln!("  string {}: {}", id, e),
        }
    }
    for id in 0..image.number_count() as u8 {
        match image.number_by_id(id) {
            Ok(number) => println!("  number {}: {}", id, number),
            Err(e) => eprintln!("  number {}: {}", id, e),
        }
    }

    // An id past the end of a table is reported, never defaulted
    println!("\nLooking up an out-of-range id...");
    match image.string_by_id(200) {
        Ok(text) => println!("Unexpected value: {:?}", text),
        Err(e) => println!("Lookup rejected: {}", e),
    }
}
