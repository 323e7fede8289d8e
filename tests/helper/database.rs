//! In-memory pacman repository databases

use flate2::Compression;
use flate2::write::GzEncoder;

/// Gzip-compressed tar with one `<member>/desc` directory per entry
pub fn repository_database(members: &[&str]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

    for member in members {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_mode(0o755);
        header.set_size(0);
        builder
            .append_data(&mut header, format!("{member}/"), std::io::empty())
            .unwrap();

        let desc = format!("%NAME%\n{member}\n");
        let mut header = tar::Header::new_gnu();
        header.set_mode(0o644);
        header.set_size(desc.len() as u64);
        builder
            .append_data(&mut header, format!("{member}/desc"), desc.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}
