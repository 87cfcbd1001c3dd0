//! Module classification.
//!
//! Walks a publish directory, and for every module decides whether symbols are already
//! available (a sibling `.pdb` or an embedded portable PDB) or must be fetched.

use std::fs;
use std::path::{Path, PathBuf};

use goblin::pe::section_table::SectionTable;
use goblin::pe::PE;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{SymbolError, SymbolResult};

/// Extension of the modules we classify (matched case-insensitively).
pub const MODULE_EXTENSION: &str = "dll";

/// Extension of a standalone symbol file.
pub const SYMBOL_EXTENSION: &str = "pdb";

/// `IMAGE_DEBUG_TYPE_EMBEDDED_PORTABLE_PDB`.
pub const DEBUG_TYPE_EMBEDDED_PORTABLE_PDB: u32 = 17;

/// Size of one `IMAGE_DEBUG_DIRECTORY` record.
const DEBUG_DIRECTORY_ENTRY_SIZE: usize = 28;

/// Offset of the `Type` field inside an `IMAGE_DEBUG_DIRECTORY` record.
const DEBUG_DIRECTORY_TYPE_OFFSET: usize = 12;

/// Where a module's symbols come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleClass {
    /// A `<stem>.pdb` sits next to the module.
    HasLocalSymbolFile,
    /// The debug directory carries an embedded portable PDB.
    HasEmbeddedSymbols,
    /// Nothing local; symbols must be downloaded.
    NeedsFetch,
}

/// Partition of every module found under a root directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub local_symbols: Vec<PathBuf>,
    pub embedded_symbols: Vec<PathBuf>,
    pub to_download: Vec<PathBuf>,
}

impl Classification {
    /// Total number of modules classified.
    pub fn len(&self) -> usize {
        self.local_symbols.len() + self.embedded_symbols.len() + self.to_download.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, class: ModuleClass, path: PathBuf) {
        match class {
            ModuleClass::HasLocalSymbolFile => self.local_symbols.push(path),
            ModuleClass::HasEmbeddedSymbols => self.embedded_symbols.push(path),
            ModuleClass::NeedsFetch => self.to_download.push(path),
        }
    }
}

/// Recursively classify every module under `root`.
///
/// Any module that cannot be read or parsed aborts the whole classification.
pub fn classify_directory(root: &Path) -> SymbolResult<Classification> {
    let mut classification = Classification::default();
    for module in find_modules(root)? {
        let class = classify_module(&module)?;
        tracing::debug!(module = %module.display(), ?class, "classified module");
        classification.push(class, module);
    }
    Ok(classification)
}

/// Enumerate module files under `root` at any depth, in file-name order per directory.
pub fn find_modules(root: &Path) -> SymbolResult<Vec<PathBuf>> {
    let mut modules = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry
            .map_err(|e| SymbolError::Walk { root: root.to_path_buf(), reason: e.to_string() })?;
        if entry.file_type().is_file() && is_module(entry.path()) {
            modules.push(entry.into_path());
        }
    }
    Ok(modules)
}

fn is_module(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MODULE_EXTENSION))
}

/// Classify a single module. The sibling-file check runs before any header read.
pub fn classify_module(module: &Path) -> SymbolResult<ModuleClass> {
    if module.with_extension(SYMBOL_EXTENSION).is_file() {
        return Ok(ModuleClass::HasLocalSymbolFile);
    }
    if has_embedded_symbols(module)? {
        return Ok(ModuleClass::HasEmbeddedSymbols);
    }
    Ok(ModuleClass::NeedsFetch)
}

/// True when any debug directory entry of the module is an embedded portable PDB.
pub fn has_embedded_symbols(module: &Path) -> SymbolResult<bool> {
    let bytes = fs::read(module).map_err(|e| SymbolError::binary_read(module, e))?;
    let types =
        debug_entry_types(&bytes).map_err(|reason| SymbolError::binary_read(module, reason))?;
    Ok(types.contains(&DEBUG_TYPE_EMBEDDED_PORTABLE_PDB))
}

/// Read the `Type` tag of every entry in the PE debug directory.
///
/// A module without a debug directory yields an empty list.
pub fn debug_entry_types(bytes: &[u8]) -> Result<Vec<u32>, String> {
    let pe = PE::parse(bytes).map_err(|e| format!("invalid PE image: {e}"))?;
    let Some(optional_header) = pe.header.optional_header else {
        return Err("PE image has no optional header".to_string());
    };
    let Some(debug_dir) = optional_header.data_directories.get_debug_table() else {
        return Ok(Vec::new());
    };
    if debug_dir.size == 0 {
        return Ok(Vec::new());
    }

    let start = rva_to_offset(debug_dir.virtual_address, &pe.sections).ok_or_else(|| {
        format!("debug directory RVA 0x{:X} is not mapped by any section", debug_dir.virtual_address)
    })?;
    let end = start
        .checked_add(debug_dir.size as usize)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            format!("debug directory at 0x{start:X} (+0x{:X}) exceeds file size", debug_dir.size)
        })?;

    Ok(bytes[start..end]
        .chunks_exact(DEBUG_DIRECTORY_ENTRY_SIZE)
        .map(|entry| {
            let field = &entry[DEBUG_DIRECTORY_TYPE_OFFSET..DEBUG_DIRECTORY_TYPE_OFFSET + 4];
            u32::from_le_bytes([field[0], field[1], field[2], field[3]])
        })
        .collect())
}

fn rva_to_offset(rva: u32, sections: &[SectionTable]) -> Option<usize> {
    let rva = rva as u64;
    sections.iter().find_map(|sec| {
        let start = sec.virtual_address as u64;
        let size = if sec.virtual_size == 0 {
            sec.size_of_raw_data as u64
        } else {
            sec.virtual_size as u64
        };
        if rva >= start && rva < start + size {
            Some((sec.pointer_to_raw_data as u64 + (rva - start)) as usize)
        } else {
            None
        }
    })
}
