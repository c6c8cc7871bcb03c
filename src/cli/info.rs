use std::path::Path;

use penny::error::Result;
use penny::fmt::format_bytes;
use penny::processor::file_info;

pub fn run(file: &str) -> Result<()> {
    let info = file_info(Path::new(file))?;

    println!("File:       {}", info.name);
    println!("Type:       {}", info.file_type);
    println!("Size:       {} ({} bytes)", format_bytes(info.size_bytes), info.size_bytes);
    println!("SHA-256:    {}", info.checksum);
    Ok(())
}
