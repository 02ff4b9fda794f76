use std::io::stdin;
use std::process;

use credentials::{hash_password, verify_password, HashParams};

// Prints a password hash for seeding users directly in the database.
// Use release build for performance, debug build is VERY slow
fn main() {
    let mut password = String::new();
    println!("Enter password to hash (no whitespace!):");
    if let Err(err) = stdin().read_line(&mut password) {
        eprintln!("Failed to read password: {}", err);
        process::exit(1);
    }
    let password = password.trim();

    if password.is_empty() {
        println!("Password cannot be empty.");
        return;
    }

    let password_hash = match hash_password(password, HashParams::recommended()) {
        Ok(hash) => hash,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    };

    println!("Generated password hash: {}", password_hash);
    println!("Verification result: {}", verify_password(password, &password_hash).unwrap_or(false));
}
