//! `multipart/form-data` decoding.
//!
//! Parts with a filename become [`UploadedFile`]s, the others plain form
//! fields. The whole body is held in memory.

use crate::error::MultipartError;
use crate::upload::UploadedFile;

/// A decoded multipart body.
#[derive(Debug, Default)]
pub struct FormData {
    /// Plain fields in body order.
    pub fields: Vec<(String, String)>,
    /// Uploaded files in body order.
    pub files: Vec<UploadedFile>,
}

/// Extracts the boundary parameter from a multipart content type.
pub fn boundary(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// Decodes a multipart body.
pub fn parse(content_type: &str, body: &[u8]) -> Result<FormData, MultipartError> {
    let boundary = boundary(content_type).ok_or(MultipartError::MissingBoundary)?;
    let delimiter = format!("--{boundary}").into_bytes();
    let next_delimiter = format!("\r\n--{boundary}").into_bytes();

    let start = find(body, &delimiter, 0).ok_or(MultipartError::MissingDelimiter)?;
    let mut pos = start + delimiter.len();
    let mut form = FormData::default();

    loop {
        if body[pos..].starts_with(b"--") {
            break;
        }
        pos = skip_line_break(body, pos);

        let end = find(body, &next_delimiter, pos).ok_or_else(|| {
            MultipartError::MalformedPart("part is not terminated by a boundary".into())
        })?;
        read_part(&body[pos..end], &mut form)?;
        pos = end + next_delimiter.len();
    }

    Ok(form)
}

fn read_part(part: &[u8], form: &mut FormData) -> Result<(), MultipartError> {
    let split = find(part, b"\r\n\r\n", 0)
        .ok_or_else(|| MultipartError::MalformedPart("missing header separator".into()))?;
    let headers = String::from_utf8_lossy(&part[..split]);
    let content = &part[split + 4..];

    let mut name = None;
    let mut file_name = None;
    let mut content_type = None;

    for line in headers.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';').skip(1) {
                if let Some((k, v)) = param.trim().split_once('=') {
                    let v = v.trim().trim_matches('"').to_string();
                    match k.trim() {
                        "name" => name = Some(v),
                        "filename" => file_name = Some(v),
                        _ => {}
                    }
                }
            }
        } else if key.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_string());
        }
    }

    let name =
        name.ok_or_else(|| MultipartError::MalformedPart("part without a field name".into()))?;

    match file_name {
        Some(file_name) => form.files.push(UploadedFile {
            field: name,
            file_name,
            content_type: content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
            data: content.to_vec(),
        }),
        None => form
            .fields
            .push((name, String::from_utf8_lossy(content).into_owned())),
    }

    Ok(())
}

fn skip_line_break(body: &[u8], pos: usize) -> usize {
    if body[pos..].starts_with(b"\r\n") {
        pos + 2
    } else if body[pos..].starts_with(b"\n") {
        pos + 1
    } else {
        pos
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|i| i + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT_TYPE: &str = "multipart/form-data; boundary=XyZ";

    fn body() -> Vec<u8> {
        [
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"field1\"\r\n",
            "\r\n",
            "123abc\r\n",
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"file1\"; filename=\"to_upload.txt\"\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "hello\r\nworld!\r\n",
            "--XyZ--\r\n",
        ]
        .concat()
        .into_bytes()
    }

    #[test]
    fn test_boundary() {
        assert_eq!(boundary(CONTENT_TYPE), Some("XyZ".to_string()));
        assert_eq!(
            boundary("multipart/form-data; charset=utf-8; Boundary=\"a b\""),
            Some("a b".to_string())
        );
        assert_eq!(boundary("multipart/form-data"), None);
    }

    #[test]
    fn test_parse_fields_and_files() {
        let form = parse(CONTENT_TYPE, &body()).unwrap();

        assert_eq!(form.fields, vec![("field1".to_string(), "123abc".to_string())]);
        assert_eq!(form.files.len(), 1);

        let file = &form.files[0];
        assert_eq!(file.field, "file1");
        assert_eq!(file.file_name, "to_upload.txt");
        assert_eq!(file.content_type, "text/plain");
        assert_eq!(file.data, b"hello\r\nworld!");
    }

    #[test]
    fn test_empty_form() {
        let form = parse(CONTENT_TYPE, b"--XyZ--\r\n").unwrap();
        assert!(form.fields.is_empty());
        assert!(form.files.is_empty());
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse("multipart/form-data", &body()).unwrap_err(),
            MultipartError::MissingBoundary
        );
        assert_eq!(
            parse("multipart/form-data; boundary=other", &body()).unwrap_err(),
            MultipartError::MissingDelimiter
        );
        assert!(matches!(
            parse(CONTENT_TYPE, b"--XyZ\r\nno separator here"),
            Err(MultipartError::MalformedPart(_))
        ));
    }
}
