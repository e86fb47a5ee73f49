//! Shared test fixtures: a freshly generated contractor database per test.
#![allow(dead_code)]

use std::io::Write;

use cardfile::MAGIC;
use tempfile::NamedTempFile;

/// Field layout every fixture uses: (name, width).
pub const SCHEMA: [(&str, u16); 6] = [
    ("name", 32),
    ("location", 64),
    ("specialties", 64),
    ("size", 6),
    ("rate", 8),
    ("owner", 8),
];

/// 29 contractors. Deliberate shape: record 3 is the canonical
/// read-target, exactly nine names start with "b", "Buonarotti" appears
/// three times (once in Smallville), and "Bob & Sons Plumbing" is the
/// only bob-prefixed name in Smallville. Every name_location key is
/// unique.
pub const CONTRACTORS: [[&str; 6]; 29] = [
    ["Bitter Homes & Gardens", "Smallville", "Heating, Painting, Plumbing", "4", "$75.00", ""],
    ["Buonarotti & Company", "Smallville", "Air Conditioning, Painting", "10", "$40.00", ""],
    ["Swanders & Flaughn", "Lendmarch", "Heating, Air Conditioning", "8", "$85.00", ""],
    ["Hamner & Tong", "Whoville", "Roofing, Carpets, Electrical", "9", "$90.00", ""],
    ["Dogs With Tools", "Smallville", "Roofing, Electrical", "7", "$32.00", ""],
    ["Bob & Sons Plumbing", "Smallville", "Plumbing, Drywall", "5", "$55.00", ""],
    ["Moore Power Tool Ya", "Lendmarch", "Electrical, Heating, Glass", "6", "$95.00", ""],
    ["Buonarotti & Company", "Whoville", "Drywall, Roofing", "12", "$60.00", ""],
    ["Fred & Nobby", "EmeraldCity", "Electrical, Heating", "5", "$50.00", ""],
    ["Philharmonic Remodeling", "Gotham", "Carpets, Drywall", "10", "$78.00", ""],
    ["Bitter Homes & Gardens", "Gotham", "Plumbing, Heating", "14", "$38.00", ""],
    ["Got Wood?", "Atlantis", "Carpentry, Decking", "7", "$44.00", ""],
    ["Buchbinder Construction", "Metropolis", "Concrete, Masonry", "16", "$88.00", ""],
    ["Dogs With Tools", "Gotham", "Roofing, Carpets", "9", "$36.00", ""],
    ["Hamner & Tong", "Metropolis", "Electrical, Glass", "11", "$92.00", ""],
    ["Bodgit & Scarper", "Gotham", "Painting, Drywall", "6", "$48.00", ""],
    ["Swanders & Flaughn", "Whoville", "Plumbing, Decking", "8", "$79.00", ""],
    ["Moore Power Tool Ya", "Atlantis", "Heating, Roofing", "4", "$94.00", ""],
    ["Light Years Ahead", "EmeraldCity", "Electrical", "3", "$67.00", ""],
    ["Bullocks Under Par", "Smallville", "Golf Courses, Landscaping", "18", "$120.00", ""],
    ["Fred & Nobby", "Metropolis", "Plumbing, Heating", "7", "$52.00", ""],
    ["Got Wood?", "Lendmarch", "Carpentry, Framing", "9", "$41.00", ""],
    ["Philharmonic Remodeling", "Smallville", "Drywall, Painting", "5", "$76.00", ""],
    ["Buonarotti & Company", "Gotham", "Air Conditioning", "10", "$62.00", ""],
    ["Light Years Ahead", "Gotham", "Electrical, Glass", "6", "$70.00", ""],
    ["Wheelbarrow Wonders", "Atlantis", "Landscaping, Decking", "8", "$33.00", ""],
    ["Dogs With Tools", "EmeraldCity", "Electrical, Roofing", "5", "$39.00", ""],
    ["Hamner & Tong", "Atlantis", "Carpets, Drywall", "10", "$89.00", ""],
    ["ZimZam Builders", "Metropolis", "Concrete, Framing", "13", "$81.00", ""],
];

/// Writes a database file with the full contractor dataset.
pub fn fixture() -> NamedTempFile {
    fixture_with(&CONTRACTORS)
}

/// Writes a database file with the standard schema and no records.
pub fn empty_fixture() -> NamedTempFile {
    fixture_with(&[])
}

/// Writes a database file with the standard schema and the given records.
pub fn fixture_with(records: &[[&str; 6]]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    let out = tmp.as_file_mut();

    let data_len: u32 = SCHEMA.iter().map(|(_, w)| u32::from(*w)).sum();
    out.write_all(&MAGIC.to_be_bytes()).unwrap();
    out.write_all(&data_len.to_be_bytes()).unwrap();
    out.write_all(&(SCHEMA.len() as u16).to_be_bytes()).unwrap();
    for (name, width) in SCHEMA {
        out.write_all(&(name.len() as u16).to_be_bytes()).unwrap();
        out.write_all(name.as_bytes()).unwrap();
        out.write_all(&width.to_be_bytes()).unwrap();
    }

    for record in records {
        out.write_all(&[0u8]).unwrap();
        for ((_, width), value) in SCHEMA.iter().zip(record) {
            let mut bytes = value.as_bytes().to_vec();
            bytes.resize(usize::from(*width), b' ');
            out.write_all(&bytes).unwrap();
        }
    }

    out.flush().unwrap();
    tmp
}

/// Owned field values for a fixture record.
pub fn values(record: [&str; 6]) -> Vec<String> {
    record.iter().map(|s| s.to_string()).collect()
}

/// Owned criteria from per-field options.
pub fn criteria(entries: [Option<&str>; 6]) -> Vec<Option<String>> {
    entries.iter().map(|e| e.map(str::to_string)).collect()
}
