//! Minimal PE32 images for classification tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const DEBUG_TYPE_COFF: u32 = 1;
pub const DEBUG_TYPE_EMBEDDED_PORTABLE_PDB: u32 = 17;

const PE_OFFSET: usize = 0x80;
const OPTIONAL_HEADER_SIZE: usize = 0xE0;
const SECTION_RVA: u32 = 0x1000;
const SECTION_FILE_OFFSET: usize = 0x200;
const SECTION_SIZE: usize = 0x200;
const FILE_SIZE: usize = SECTION_FILE_OFFSET + SECTION_SIZE;

fn put_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Build a one-section PE32 DLL whose debug directory holds one entry per type given.
///
/// An empty slice produces an image with no debug directory at all.
pub fn pe_with_debug_entries(types: &[u32]) -> Vec<u8> {
    let mut buf = vec![0u8; FILE_SIZE];

    // DOS header.
    buf[0] = b'M';
    buf[1] = b'Z';
    put_u32(&mut buf, 0x3c, PE_OFFSET as u32);

    // PE signature + COFF header.
    buf[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");
    let coff = PE_OFFSET + 4;
    put_u16(&mut buf, coff, 0x14c); // i386
    put_u16(&mut buf, coff + 2, 1); // sections
    put_u16(&mut buf, coff + 16, OPTIONAL_HEADER_SIZE as u16);
    put_u16(&mut buf, coff + 18, 0x2102); // executable | 32-bit | dll

    // Optional header (PE32).
    let opt = coff + 20;
    put_u16(&mut buf, opt, 0x10b);
    let windows = opt + 28;
    put_u32(&mut buf, windows, 0x1000_0000); // image base
    put_u32(&mut buf, windows + 4, 0x1000); // section alignment
    put_u32(&mut buf, windows + 8, 0x200); // file alignment
    put_u16(&mut buf, windows + 12, 4); // major os
    put_u16(&mut buf, windows + 20, 4); // major subsystem
    put_u32(&mut buf, windows + 28, 0x2000); // size of image
    put_u32(&mut buf, windows + 32, SECTION_FILE_OFFSET as u32); // size of headers
    put_u16(&mut buf, windows + 40, 3); // console subsystem
    put_u32(&mut buf, windows + 64, 16); // number of data directories
    let directories = windows + 68;
    if !types.is_empty() {
        let debug = directories + 6 * 8;
        put_u32(&mut buf, debug, SECTION_RVA);
        put_u32(&mut buf, debug + 4, (types.len() * 28) as u32);
    }

    // Section table.
    let section = opt + OPTIONAL_HEADER_SIZE;
    buf[section..section + 6].copy_from_slice(b".rdata");
    put_u32(&mut buf, section + 8, SECTION_SIZE as u32); // virtual size
    put_u32(&mut buf, section + 12, SECTION_RVA);
    put_u32(&mut buf, section + 16, SECTION_SIZE as u32); // raw size
    put_u32(&mut buf, section + 20, SECTION_FILE_OFFSET as u32);
    put_u32(&mut buf, section + 36, 0x4000_0040); // initialized data | read

    // Debug directory entries.
    for (idx, ty) in types.iter().enumerate() {
        let entry = SECTION_FILE_OFFSET + idx * 28;
        put_u16(&mut buf, entry + 8, 1); // major version
        put_u32(&mut buf, entry + 12, *ty);
    }

    buf
}

pub fn write_module(path: &Path, types: &[u32]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create module dir");
    }
    fs::write(path, pe_with_debug_entries(types)).expect("write module");
}

pub fn write_embedded(path: &Path) {
    write_module(path, &[DEBUG_TYPE_COFF, DEBUG_TYPE_EMBEDDED_PORTABLE_PDB]);
}

pub fn write_plain(path: &Path) {
    write_module(path, &[DEBUG_TYPE_COFF]);
}
