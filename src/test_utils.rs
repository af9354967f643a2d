//! Shared test utilities: on-disk project fixtures and log capture.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// A temporary directory tree holding project and solution files.
pub(crate) struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::Builder::new()
                .prefix("msproj-fixture")
                .tempdir()
                .unwrap(),
        }
    }

    pub(crate) fn root(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub(crate) fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }
}

/// Wrap `body` in a namespace-qualified `<Project>` element.
pub(crate) fn project_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="14.0" DefaultTargets="Build" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
{body}
</Project>"#
    )
}

/// A classic Visual Studio project with Debug/Release groups for each of
/// `platforms` (project-file spelling, e.g. `AnyCPU`, `x86`).
///
/// Non-`AnyCPU` groups declare a matching `PlatformTarget`.
pub(crate) fn sample_project(guid: &str, platforms: &[&str]) -> String {
    let mut body = format!(
        r#"<PropertyGroup>
    <Configuration Condition=" '$(Configuration)' == '' ">Debug</Configuration>
    <Platform Condition=" '$(Platform)' == '' ">AnyCPU</Platform>
    <ProjectGuid>{guid}</ProjectGuid>
    <OutputType>Library</OutputType>
    <RootNamespace>Sample</RootNamespace>
    <AssemblyName>Sample</AssemblyName>
    <TargetFrameworkVersion>v4.5</TargetFrameworkVersion>
  </PropertyGroup>
"#
    );
    for platform in platforms {
        for config in ["Debug", "Release"] {
            let target = if *platform == "AnyCPU" {
                String::new()
            } else {
                format!("<PlatformTarget>{platform}</PlatformTarget>")
            };
            body.push_str(&format!(
                r#"  <PropertyGroup Condition=" '$(Configuration)|$(Platform)' == '{config}|{platform}' ">
    {target}
    <OutputPath>bin\{platform}\{config}\</OutputPath>
  </PropertyGroup>
"#
            ));
        }
    }
    body.push_str(
        r#"  <ItemGroup>
    <Compile Include="Class1.cs" />
  </ItemGroup>"#,
    );
    project_xml(&body)
}

// ─── Log capture ─────────────────────────────────────────────────────────────

#[derive(Clone)]
struct BufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer
            .lock()
            .map_err(|_| std::io::Error::other("buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a thread-local subscriber and return its value together
/// with everything logged at `DEBUG` and above.
pub(crate) fn with_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_writer(BufferWriter {
            buffer: buffer.clone(),
        })
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .finish();

    let value = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.lock().unwrap()).to_string();
    (value, logs)
}
