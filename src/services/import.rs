use crate::error::AppError;
use crate::upstream::Upload;

pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;
const ACCEPTED_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

/// Student spreadsheet upload, checked before it is forwarded. The backend
/// parses the sheet itself.
#[derive(Debug, Clone, Default)]
pub struct BulkImport {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub program_id: Option<i64>,
    pub group_id: Option<i64>,
    pub training_course_id: Option<i64>,
}

impl BulkImport {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.bytes.is_empty() {
            return Err(AppError::BadRequest("No file selected".to_string()));
        }
        let name = self.file_name.to_lowercase();
        if !ACCEPTED_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            return Err(AppError::BadRequest(
                "Only .xlsx and .xls files are accepted".to_string(),
            ));
        }
        if self.bytes.len() > MAX_IMPORT_BYTES {
            return Err(AppError::BadRequest("File exceeds 10 MB".to_string()));
        }
        if self.program_id.is_none() {
            return Err(AppError::BadRequest("A program must be selected".to_string()));
        }
        Ok(())
    }

    pub fn into_upload(self) -> Result<Upload, AppError> {
        self.validate()?;

        let mut fields = Vec::new();
        if let Some(program) = self.program_id {
            fields.push(("program_id".to_string(), program.to_string()));
        }
        if let Some(group) = self.group_id {
            fields.push(("group_id".to_string(), group.to_string()));
        }
        if let Some(course) = self.training_course_id {
            fields.push(("training_course_id".to_string(), course.to_string()));
        }

        Ok(Upload {
            file_name: self.file_name,
            bytes: self.bytes,
            fields,
        })
    }
}
