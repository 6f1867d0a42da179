//! Material library (`.mtl`) parsing

use std::fs::File;
use std::io::BufReader;

use super::obj::{expect_tokens, parse_float, parse_floats};
use super::{for_each_line, tokenize, ModelLoader};
use crate::errors::ParseError;
use crate::resource::Material;

impl ModelLoader {
    /// Parse `name` relative to the model directory. Failing to open or read
    /// it is reported to the caller; materials read up to that point are kept.
    pub(super) fn load_material_library(&mut self, name: &str) -> Result<(), ParseError> {
        let path = self.base_path.join(name);
        let file = File::open(&path).map_err(|err| ParseError::MaterialLibrary {
            name: name.to_string(),
            reason: err.to_string(),
        })?;

        let before = self.resources.materials.len();
        let mut pending: Option<Material> = None;

        let read = for_each_line(BufReader::new(file), |number, line| {
            if let Err(err) = self.parse_material_line(line, &mut pending) {
                log::warn!("{}:{}: {}", path.display(), number, err);
                self.skipped_lines += 1;
            }
        });
        // keep what was read before a failure
        if let Some(material) = pending.take() {
            self.add_material(material);
        }
        read.map_err(|err| ParseError::MaterialLibrary {
            name: name.to_string(),
            reason: err.to_string(),
        })?;

        log::debug!(
            "{}: {} materials",
            path.display(),
            self.resources.materials.len() - before
        );
        Ok(())
    }

    fn parse_material_line(&mut self, line: &str, pending: &mut Option<Material>) -> Result<(), ParseError> {
        let tokens = tokenize(line);
        let Some(&directive) = tokens.first() else {
            return Ok(());
        };

        if directive == "newmtl" {
            expect_tokens(&tokens, 2)?;
            if let Some(done) = pending.replace(Material::new(tokens[1])) {
                self.add_material(done);
            }
            return Ok(());
        }

        // Anything before the first newmtl has nowhere to go
        let Some(material) = pending.as_mut() else {
            return Ok(());
        };

        match directive {
            "Ka" => {
                expect_tokens(&tokens, 4)?;
                material.ambient = parse_floats(&tokens[1..4])?;
            }
            "Kd" => {
                expect_tokens(&tokens, 4)?;
                material.diffuse = parse_floats(&tokens[1..4])?;
            }
            "Ks" => {
                expect_tokens(&tokens, 4)?;
                material.specular = parse_floats(&tokens[1..4])?;
            }
            "Ns" => {
                expect_tokens(&tokens, 2)?;
                material.shininess = parse_float(tokens[1])?;
            }
            "map_Kd" => {
                expect_tokens(&tokens, 2)?;
                // options such as `-s 1 1 1` come before the file name
                let file = tokens[tokens.len() - 1];
                material.texture_name = file.to_string();
                let image = self
                    .decoder
                    .decode(&self.base_path.join(file))
                    .map_err(|err| ParseError::Texture {
                        name: file.to_string(),
                        reason: err.to_string(),
                    })?;
                log::debug!("texture {} ({}x{}, {} channels)", file, image.width, image.height, image.channels);
                material.image = self.resources.images.insert(image);
            }
            other => log::debug!("ignoring material directive `{}`", other),
        }
        Ok(())
    }

    /// Unnamed materials are dropped
    fn add_material(&mut self, material: Material) {
        if material.name.is_empty() {
            return;
        }
        let name = material.name.clone();
        let handle = self.resources.materials.insert(material);
        self.material_names.insert(name, handle);
    }
}

