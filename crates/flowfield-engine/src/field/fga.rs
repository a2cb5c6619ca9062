use std::path::Path;

use glam::Vec3;

use super::{FieldError, VectorField};

/// Reads a "fluid grid ASCII" file.
pub fn load_fga(path: impl AsRef<Path>) -> Result<VectorField, FieldError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| FieldError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let field = parse_fga(&text)?;
    log::info!(
        "loaded field {} ({}x{}x{})",
        path.display(),
        field.dims[0],
        field.dims[1],
        field.dims[2]
    );
    Ok(field)
}

/// Parses FGA text: comma-separated `nx, ny, nz, min xyz, max xyz`, then
/// `nx * ny * nz` vectors of three components. Whitespace and trailing commas
/// are ignored.
pub fn parse_fga(text: &str) -> Result<VectorField, FieldError> {
    let values = text
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .enumerate()
        .map(|(index, t)| {
            t.parse::<f32>().map_err(|_| FieldError::BadNumber {
                index,
                token: t.to_owned(),
            })
        })
        .collect::<Result<Vec<f32>, _>>()?;

    if values.len() < 9 {
        return Err(FieldError::TruncatedHeader(values.len()));
    }

    let raw_dims = [values[0] as i64, values[1] as i64, values[2] as i64];
    if raw_dims.iter().any(|&d| d <= 0) {
        return Err(FieldError::BadDimensions(raw_dims));
    }
    let dims = raw_dims.map(|d| d as u32);

    let expected = dims.iter().map(|&d| d as usize).product::<usize>();
    let body = &values[9..];
    if body.len() != expected * 3 {
        return Err(FieldError::VectorCount {
            expected,
            found: body.len(),
        });
    }

    Ok(VectorField {
        dims,
        min: Vec3::new(values[3], values[4], values[5]),
        max: Vec3::new(values[6], values[7], values[8]),
        texels: body.chunks_exact(3).map(|v| [v[0], v[1], v[2], 1.0]).collect(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SMALL: &str = "2,1,2,\n-1,-1,-1,\n1,1,1,\n\
        1,0,0,\n0,1,0,\n\
        0,0,1,\n-1,0,0,\n";

    #[test]
    fn parses_header_and_vectors() {
        let f = parse_fga(SMALL).unwrap();
        assert_eq!(f.dims, [2, 1, 2]);
        assert_eq!(f.min, Vec3::splat(-1.0));
        assert_eq!(f.max, Vec3::ONE);
        assert_eq!(f.len(), 4);
        assert_eq!(f.at(1, 0, 0), Some([0.0, 1.0, 0.0, 1.0]));
        assert_eq!(f.at(1, 0, 1), Some([-1.0, 0.0, 0.0, 1.0]));
        assert_eq!(f.at(2, 0, 0), None);
    }

    #[test]
    fn rejects_short_bodies() {
        let err = parse_fga("2,2,2,-1,-1,-1,1,1,1,0,0,1").unwrap_err();
        assert!(matches!(
            err,
            FieldError::VectorCount {
                expected: 8,
                found: 3
            }
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_fga("2,2,x"),
            Err(FieldError::BadNumber { index: 2, .. })
        ));
        assert!(matches!(parse_fga("1,1"), Err(FieldError::TruncatedHeader(2))));
        assert!(matches!(
            parse_fga("0,1,1,0,0,0,1,1,1"),
            Err(FieldError::BadDimensions(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SMALL.as_bytes()).unwrap();
        let f = load_fga(file.path()).unwrap();
        assert_eq!(f.dims, [2, 1, 2]);

        assert!(matches!(
            load_fga(file.path().with_extension("missing")),
            Err(FieldError::Io { .. })
        ));
    }
}
