//! List commands implementation

use nandflasher_flash::available_programmers;

/// List all programmers compiled into this binary
pub fn list_programmers() {
    let programmers = available_programmers();

    println!("Supported programmers:");
    println!();
    if programmers.is_empty() {
        println!("  (none - rebuild with the dummy or ftdi feature)");
        return;
    }
    for info in programmers {
        let aliases = if info.aliases.is_empty() {
            String::new()
        } else {
            format!(" (alias: {})", info.aliases.join(", "))
        };
        println!("  {:<10} - {}{}", info.name, info.description, aliases);
    }
}
