//! Mesh (`.obj`) line parsing

use std::io::{self, BufRead};
use std::path::Path;

use super::{for_each_line, tokenize, ModelLoader};
use crate::errors::ParseError;
use crate::resource::{Handle, Normal, TextureCoord, Triangle, Vertex};

/// One `v/t/n` corner of a face, 1-based, 0 when the component is absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FaceVertex {
    position: usize,
    tex_coord: usize,
    normal: usize,
}

impl ModelLoader {
    pub(super) fn parse_mesh(&mut self, reader: impl BufRead, source: &Path) -> io::Result<()> {
        for_each_line(reader, |number, line| {
            if let Err(err) = self.parse_mesh_line(line) {
                log::warn!("{}:{}: {}", source.display(), number, err);
                self.skipped_lines += 1;
            }
        })
    }

    fn parse_mesh_line(&mut self, line: &str) -> Result<(), ParseError> {
        let tokens = tokenize(line);
        let Some(&directive) = tokens.first() else {
            return Ok(());
        };

        match directive {
            "v" => {
                expect_tokens(&tokens, 4)?;
                let [x, y, z] = parse_floats(&tokens[1..4])?;
                self.resources.vertices.insert(Vertex::new(x, y, z));
            }
            "vt" => {
                expect_tokens(&tokens, 3)?;
                let [u, v] = parse_floats(&tokens[1..3])?;
                self.resources.tex_coords.insert(TextureCoord::new(u, v));
            }
            "vn" => {
                expect_tokens(&tokens, 4)?;
                let [x, y, z] = parse_floats(&tokens[1..4])?;
                self.resources.normals.insert(Normal::new(x, y, z));
            }
            "f" => {
                expect_tokens(&tokens, 4)?;
                let corners = tokens[1..]
                    .iter()
                    .map(|spec| parse_face_vertex(spec))
                    .collect::<Result<Vec<_>, _>>()?;
                self.add_face(&corners);
            }
            "mtllib" => {
                expect_tokens(&tokens, 2)?;
                // each library that fails counts as one skipped line
                for name in &tokens[1..] {
                    if let Err(err) = self.load_material_library(name) {
                        log::warn!("{}", err);
                        self.skipped_lines += 1;
                    }
                }
            }
            "usemtl" => {
                expect_tokens(&tokens, 2)?;
                self.current_material = tokens[1].to_string();
            }
            "o" => {
                expect_tokens(&tokens, 2)?;
                self.object_name = tokens[1].to_string();
            }
            "g" | "s" => {}
            other => log::debug!("ignoring `{}` directive", other),
        }
        Ok(())
    }

    /// Fan-triangulate around the first corner
    fn add_face(&mut self, corners: &[FaceVertex]) {
        let first = corners[0];
        for pair in corners[1..].windows(2) {
            let face = [first, pair[0], pair[1]];
            let has_tex_coords = face.iter().all(|c| c.tex_coord > 0);
            let has_normals = face.iter().all(|c| c.normal > 0);

            let mut triangle = Triangle {
                vertices: face.map(|c| Handle::from_index(c.position - 1)),
                has_tex_coords,
                has_normals,
                material_name: self.current_material.clone(),
                ..Triangle::default()
            };
            if has_tex_coords {
                triangle.tex_coords = face.map(|c| Handle::from_index(c.tex_coord - 1));
            }
            if has_normals {
                triangle.normals = face.map(|c| Handle::from_index(c.normal - 1));
            }
            self.resources.triangles.insert(triangle);
        }
    }
}

pub(super) fn expect_tokens(tokens: &[&str], expected: usize) -> Result<(), ParseError> {
    if tokens.len() < expected {
        return Err(ParseError::MissingTokens {
            directive: tokens.first().unwrap_or(&"").to_string(),
            expected,
            found: tokens.len(),
        });
    }
    Ok(())
}

pub(super) fn parse_float(token: &str) -> Result<f32, ParseError> {
    token
        .parse()
        .map_err(|_| ParseError::InvalidNumber(token.to_string()))
}

pub(super) fn parse_floats<const N: usize>(tokens: &[&str]) -> Result<[f32; N], ParseError> {
    let mut out = [0.0; N];
    for (slot, token) in out.iter_mut().zip(tokens) {
        *slot = parse_float(token)?;
    }
    Ok(out)
}

/// `v`, `v/t`, `v//n` or `v/t/n`
fn parse_face_vertex(spec: &str) -> Result<FaceVertex, ParseError> {
    let mut parts = spec.split('/');

    let position = match parts.next() {
        Some(p) if !p.is_empty() => parse_index(p)?,
        _ => return Err(ParseError::MissingVertexIndex(spec.to_string())),
    };
    if position == 0 {
        return Err(ParseError::InvalidIndex(spec.to_string()));
    }

    let tex_coord = parse_optional_index(parts.next())?;
    let normal = parse_optional_index(parts.next())?;

    Ok(FaceVertex {
        position,
        tex_coord,
        normal,
    })
}

/// Handles are 32-bit, so larger indices are rejected here
fn parse_index(token: &str) -> Result<usize, ParseError> {
    token
        .parse::<u32>()
        .map(|i| i as usize)
        .map_err(|_| ParseError::InvalidIndex(token.to_string()))
}

fn parse_optional_index(token: Option<&str>) -> Result<usize, ParseError> {
    match token {
        Some(t) if !t.is_empty() => parse_index(t),
        _ => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_vertex_forms() {
        let fv = |p, t, n| FaceVertex { position: p, tex_coord: t, normal: n };
        assert_eq!(parse_face_vertex("3"), Ok(fv(3, 0, 0)));
        assert_eq!(parse_face_vertex("3/2"), Ok(fv(3, 2, 0)));
        assert_eq!(parse_face_vertex("3//5"), Ok(fv(3, 0, 5)));
        assert_eq!(parse_face_vertex("3/2/5"), Ok(fv(3, 2, 5)));
        assert_eq!(parse_face_vertex("3/0/0"), Ok(fv(3, 0, 0)));
    }

    #[test]
    fn test_face_vertex_errors() {
        assert_eq!(parse_face_vertex("/2/5"), Err(ParseError::MissingVertexIndex("/2/5".to_string())));
        assert_eq!(parse_face_vertex("0/1"), Err(ParseError::InvalidIndex("0/1".to_string())));
        assert_eq!(parse_face_vertex("-1"), Err(ParseError::InvalidIndex("-1".to_string())));
        assert_eq!(parse_face_vertex("1/a"), Err(ParseError::InvalidIndex("a".to_string())));
        assert_eq!(
            parse_face_vertex("4294967296"),
            Err(ParseError::InvalidIndex("4294967296".to_string()))
        );
        assert_eq!(parse_face_vertex("1//4294967297"), Err(ParseError::InvalidIndex("4294967297".to_string())));
        assert!(parse_face_vertex("4294967295").is_ok());
    }

    #[test]
    fn test_token_count() {
        assert!(expect_tokens(&["v", "1", "2", "3"], 4).is_ok());
        assert_eq!(
            expect_tokens(&["vn", "1"], 4),
            Err(ParseError::MissingTokens { directive: "vn".to_string(), expected: 4, found: 2 })
        );
    }

    #[test]
    fn test_parse_floats() {
        let [a, b] = parse_floats::<2>(&["1.5", "-2e1"]).unwrap();
        assert_eq!((a, b), (1.5, -20.0));
        assert!(parse_floats::<1>(&["nope"]).is_err());
    }
}
