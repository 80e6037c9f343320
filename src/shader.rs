//! Shader program sources and checked compilation.
//!
//! Every program ships embedded in the binary. A [`ShaderLibrary`] pointed at
//! a directory reads `<name>.wgsl` from there instead, so shaders can be
//! edited without rebuilding. Compilation goes through [`checked`], which
//! turns wgpu validation errors (and panics) into [`SetupError::ShaderCompile`].

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SetupError;

/// The GPU programs the renderer knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Program {
    /// Depth-only pass into the shadow map.
    Shadow,
    /// Textured Phong/Blinn lighting with shadows.
    Lit,
    /// Cube map background.
    Skybox,
    /// Unlit light position marker.
    Marker,
    /// Reflective surface sampling the skybox.
    EnvMap,
    /// Fullscreen gamma correction.
    Gamma,
}

impl Program {
    pub const ALL: [Program; 6] = [
        Program::Shadow,
        Program::Lit,
        Program::Skybox,
        Program::Marker,
        Program::EnvMap,
        Program::Gamma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Program::Shadow => "shadow",
            Program::Lit => "lit",
            Program::Skybox => "skybox",
            Program::Marker => "marker",
            Program::EnvMap => "env_map",
            Program::Gamma => "gamma",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.wgsl", self.name())
    }

    /// Programs the renderer cannot run without.
    ///
    /// A failure to build an optional program is logged and the objects
    /// using it are skipped.
    pub fn is_required(self) -> bool {
        !matches!(self, Program::EnvMap)
    }

    fn embedded(self) -> &'static str {
        match self {
            Program::Shadow => include_str!("shaders/shadow.wgsl"),
            Program::Lit => include_str!("shaders/lit.wgsl"),
            Program::Skybox => include_str!("shaders/skybox.wgsl"),
            Program::Marker => include_str!("shaders/marker.wgsl"),
            Program::EnvMap => include_str!("shaders/env_map.wgsl"),
            Program::Gamma => include_str!("shaders/gamma.wgsl"),
        }
    }
}

/// Resolves program sources.
#[derive(Clone, Debug, Default)]
pub struct ShaderLibrary {
    dir: Option<PathBuf>,
}

impl ShaderLibrary {
    /// Use only the sources compiled into the binary.
    pub fn embedded() -> Self {
        Self::default()
    }

    /// Read sources from `dir`. Every program must then exist there.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: Some(dir.as_ref().to_path_buf()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// WGSL source for `program`.
    pub fn source(&self, program: Program) -> Result<Cow<'static, str>, SetupError> {
        match &self.dir {
            None => Ok(Cow::Borrowed(program.embedded())),
            Some(dir) => {
                let path = dir.join(program.file_name());
                let source = fs::read_to_string(&path)
                    .map_err(|source| SetupError::ShaderRead { path, source })?;
                Ok(Cow::Owned(source))
            }
        }
    }

    /// Load and compile `program` into a shader module.
    pub fn module(
        &self,
        device: &wgpu::Device,
        program: Program,
    ) -> Result<wgpu::ShaderModule, SetupError> {
        let source = self.source(program)?;
        let label = format!("{} Shader", program.name());
        let module = checked(device, &label, || {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&label),
                source: wgpu::ShaderSource::Wgsl(source),
            })
        })?;
        log::info!("compiled program '{}'", program.name());
        Ok(module)
    }
}

/// Run a resource-creating closure and report validation failures as
/// [`SetupError::ShaderCompile`].
///
/// wgpu reports invalid shaders and pipelines through the device error
/// handler, which panics when no error scope is active. The closure runs
/// inside a validation scope and `catch_unwind`.
pub fn checked<T>(
    device: &wgpu::Device,
    label: &str,
    create: impl FnOnce() -> T,
) -> Result<T, SetupError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(create));
    let scope_error = pollster::block_on(device.pop_error_scope());

    match (result, scope_error) {
        (Ok(value), None) => Ok(value),
        (Ok(_), Some(error)) => Err(SetupError::ShaderCompile {
            label: label.to_string(),
            message: error.to_string(),
        }),
        (Err(panic), _) => Err(SetupError::ShaderCompile {
            label: label.to_string(),
            message: panic_message(panic.as_ref()),
        }),
    }
}

/// Pass through a build result for `program`, downgrading the failure of an
/// optional program to `None` with a warning.
pub fn optional<T>(program: Program, built: Result<T, SetupError>) -> Result<Option<T>, SetupError> {
    match built {
        Ok(value) => Ok(Some(value)),
        Err(err) if !program.is_required() => {
            log::warn!("program '{}' unavailable, skipping its objects: {err}", program.name());
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "creation panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_sources_define_entry_points() {
        let library = ShaderLibrary::embedded();
        for program in Program::ALL {
            let source = library.source(program).unwrap();
            assert!(source.contains("fn vs_main"), "{program:?} has no vs_main");
            if program != Program::Shadow {
                assert!(source.contains("fn fs_main"), "{program:?} has no fs_main");
            }
        }
    }

    #[test]
    fn directory_overrides_embedded_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gamma.wgsl"), "// custom").unwrap();

        let library = ShaderLibrary::from_dir(dir.path());
        assert_eq!(library.source(Program::Gamma).unwrap(), "// custom");
    }

    #[test]
    fn missing_file_in_directory_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let library = ShaderLibrary::from_dir(dir.path());
        match library.source(Program::Lit) {
            Err(SetupError::ShaderRead { path, .. }) => {
                assert_eq!(path, dir.path().join("lit.wgsl"));
            }
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn only_env_map_is_optional() {
        let optional: Vec<_> = Program::ALL
            .into_iter()
            .filter(|p| !p.is_required())
            .collect();
        assert_eq!(optional, vec![Program::EnvMap]);
    }

    fn compile_error(label: &str) -> SetupError {
        SetupError::ShaderCompile {
            label: label.to_string(),
            message: "bad".to_string(),
        }
    }

    #[test]
    fn optional_program_failure_becomes_none() {
        let built: Result<u32, _> = Err(compile_error("env map pipeline"));
        assert!(matches!(optional(Program::EnvMap, built), Ok(None)));
        assert!(matches!(optional(Program::EnvMap, Ok(7)), Ok(Some(7))));
    }

    #[test]
    fn required_program_failure_propagates() {
        let built: Result<u32, _> = Err(compile_error("lit pipeline"));
        match optional(Program::Lit, built) {
            Err(SetupError::ShaderCompile { label, .. }) => assert_eq!(label, "lit pipeline"),
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("bad shader");
        assert_eq!(panic_message(payload.as_ref()), "bad shader");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
    }
}
