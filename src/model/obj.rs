//! Wavefront OBJ subset: `v`, `vt`, `vn` and fully specified triangular `f`
//! records. Comments and blank lines are skipped; anything else is reported
//! and ignored.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};

use super::{Face, FaceVertex, Model, ModelError};
use crate::rasterizer::{Vec2, Vec3};

/// Load a model from an OBJ file
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Model, ModelError> {
    let contents = fs::read_to_string(path)?;
    parse_obj(&contents)
}

/// Parse OBJ text. Face indices are 1-based in the file and 0-based in the
/// returned model; each one must refer to an element declared earlier.
pub fn parse_obj(src: &str) -> Result<Model, ModelError> {
    let mut model = Model::default();

    for (i, raw) in src.lines().enumerate() {
        let line = i + 1;
        let mut fields = raw.split_whitespace();
        let Some(tag) = fields.next() else {
            continue;
        };
        let rest: Vec<&str> = fields.collect();

        match tag {
            "v" => model.vertices.push(parse_vec3(line, &rest)?),
            "vn" => model.normals.push(parse_vec3(line, &rest)?),
            "vt" => {
                if rest.len() < 2 || rest.len() > 3 {
                    return Err(parse_error(line, "vt needs 2 or 3 values"));
                }
                let u = parse_number(line, rest[0])?;
                let v = parse_number(line, rest[1])?;
                model.uvs.push(Vec2::new(u, v));
            }
            "f" => {
                let face = parse_face(line, &rest, &model)?;
                model.faces.push(face);
            }
            t if t.starts_with('#') => {}
            _ => warn!("Unsupported obj record on line {}: {}", line, raw.trim_end()),
        }
    }

    debug!(
        "Parsed obj: {} vertices, {} uvs, {} normals, {} faces",
        model.vertices.len(),
        model.uvs.len(),
        model.normals.len(),
        model.faces.len()
    );
    Ok(model)
}

fn parse_error(line: usize, message: impl Into<String>) -> ModelError {
    ModelError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_number<T: FromStr>(line: usize, field: &str) -> Result<T, ModelError> {
    field
        .parse()
        .map_err(|_| parse_error(line, format!("invalid number '{}'", field)))
}

fn parse_vec3(line: usize, fields: &[&str]) -> Result<Vec3, ModelError> {
    if fields.len() != 3 {
        return Err(parse_error(
            line,
            format!("expected 3 values, found {}", fields.len()),
        ));
    }
    Ok(Vec3::new(
        parse_number(line, fields[0])?,
        parse_number(line, fields[1])?,
        parse_number(line, fields[2])?,
    ))
}

fn parse_face(line: usize, fields: &[&str], model: &Model) -> Result<Face, ModelError> {
    if fields.len() != 3 {
        return Err(parse_error(
            line,
            format!("expected a triangle, found {} corners", fields.len()),
        ));
    }

    let mut corners = [FaceVertex::new(0, 0, 0); 3];
    for (corner, field) in corners.iter_mut().zip(fields) {
        let parts: Vec<&str> = field.split('/').collect();
        if parts.len() != 3 {
            return Err(parse_error(
                line,
                format!("corner '{}' must be vertex/texcoord/normal", field),
            ));
        }
        *corner = FaceVertex::new(
            to_index(line, "vertex", parts[0], model.vertices.len())?,
            to_index(line, "texcoord", parts[1], model.uvs.len())?,
            to_index(line, "normal", parts[2], model.normals.len())?,
        );
    }

    Ok(Face::new(corners))
}

/// 1-based file index to validated 0-based index
fn to_index(
    line: usize,
    kind: &'static str,
    field: &str,
    count: usize,
) -> Result<usize, ModelError> {
    let index: usize = parse_number(line, field)?;
    if index == 0 || index > count {
        return Err(ModelError::IndexOutOfRange {
            line,
            kind,
            index,
            count,
        });
    }
    Ok(index - 1)
}
