#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a text file under the workspace.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes an `.xlsx` workbook with a single sheet under the
    /// workspace and returns the path.
    pub fn write_xlsx(&self, name: &str, sheet_name: &str, rows: &[Vec<Fx>]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name).expect("sheet name");
        for (row, cells) in rows.iter().enumerate() {
            for (column, cell) in cells.iter().enumerate() {
                match cell {
                    Fx::Number(value) => {
                        sheet
                            .write_number(row as u32, column as u16, *value)
                            .expect("write number");
                    }
                    Fx::Text(value) => {
                        sheet
                            .write_string(row as u32, column as u16, *value)
                            .expect("write string");
                    }
                    Fx::Blank => {}
                }
            }
        }
        workbook.save(&path).expect("save workbook");
        path
    }
}

/// Fixture cell for workbook builders.
pub enum Fx {
    Number(f64),
    Text(&'static str),
    Blank,
}
