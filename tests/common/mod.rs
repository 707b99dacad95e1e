#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1252;
use tempfile::{TempDir, tempdir};

pub const BASE_HEADER: &str = "nomeCurso;Situacao;Sexo;racaCor;dataNascimento;Naturalidade;formaIngresso;IAA-indiceAproveitamentoAcumulado;MunicipioSG;UFSG;anoSemestreIngresso";

pub const EXTENDED_HEADER: &str = "nomeCurso;Situacao;Sexo;racaCor;dataNascimento;Naturalidade;formaIngresso;IAA-indiceAproveitamentoAcumulado;MunicipioSG;UFSG;anoSemestreIngresso;categoriaIngresso;estadoCivil;Nacionalidade;IAP-indiceAproveitamentoAprovacoes";

/// One data line of an export, in base-header column order.
#[derive(Debug, Clone)]
pub struct ExportRow {
    pub course: String,
    pub status: String,
    pub gender: String,
    pub race: String,
    pub birth: String,
    pub origin: String,
    pub entry_form: String,
    pub iaa: String,
    pub municipality: String,
    pub state: String,
    pub entry: String,
}

impl Default for ExportRow {
    fn default() -> Self {
        Self {
            course: "Engenharia de Software [Noturno]".into(),
            status: "Regular".into(),
            gender: "F".into(),
            race: "Parda".into(),
            birth: "15-03-2000".into(),
            origin: "SC - Florianópolis".into(),
            entry_form: "Vestibular".into(),
            iaa: "7500".into(),
            municipality: "Florianópolis".into(),
            state: "SC".into(),
            entry: "20231".into(),
        }
    }
}

impl ExportRow {
    pub fn line(&self) -> String {
        [
            &self.course,
            &self.status,
            &self.gender,
            &self.race,
            &self.birth,
            &self.origin,
            &self.entry_form,
            &self.iaa,
            &self.municipality,
            &self.state,
            &self.entry,
        ]
        .map(String::as_str)
        .join(";")
    }
}

/// Header plus rows, newline separated.
pub fn export(rows: &[ExportRow]) -> String {
    let mut text = String::from(BASE_HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(&row.line());
    }
    text.push('\n');
    text
}

/// Encodes `text` the way the registrar system writes its exports.
pub fn latin1(text: &str) -> Vec<u8> {
    let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
    assert!(!unmappable, "fixture text must be Latin-1 encodable");
    bytes.into_owned()
}

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

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    /// Writes `contents` Latin-1 encoded.
    pub fn write_export(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, &latin1(contents))
    }
}
