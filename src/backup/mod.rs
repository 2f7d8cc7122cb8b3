mod json;
mod spreadsheet;

pub(crate) use json::{export_data, import_data, read_payload, write_payload, ExportPayload};
pub(crate) use spreadsheet::{default_dir_name, write_spreadsheet};
