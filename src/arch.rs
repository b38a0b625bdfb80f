//! Target architectures.
//!
//! Each architecture knows its toolchain prefix and assembles the compiler
//! environment a recipe command sees. User-supplied variables from the
//! configuration (`env:`) override the defaults, which is how a real NDK
//! sysroot and compiler path get injected.

use std::collections::BTreeMap;
use std::fmt;

use crate::context::Context;
use crate::error::{Error, Result};

/// Names accepted by [`Arch::from_name`].
pub const KNOWN_ARCHS: &[&str] = &["armeabi", "armeabi-v7a", "arm64-v8a", "x86", "x86_64"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arch {
    pub name: String,
    /// Directory name of the NDK toolchain, e.g. `arm-linux-androideabi`.
    pub toolchain_prefix: String,
    /// Prefix of the cross tools, e.g. `i686-linux-android` for `x86`.
    pub command_prefix: String,
    extra_cflags: &'static str,
}

impl Arch {
    pub fn from_name(name: &str) -> Result<Self> {
        let (toolchain_prefix, command_prefix, extra_cflags) = match name {
            "armeabi" => ("arm-linux-androideabi", "arm-linux-androideabi", ""),
            "armeabi-v7a" => (
                "arm-linux-androideabi",
                "arm-linux-androideabi",
                " -march=armv7-a -mfloat-abi=softfp -mfpu=vfp -mthumb",
            ),
            "arm64-v8a" => ("aarch64-linux-android", "aarch64-linux-android", ""),
            "x86" => ("x86", "i686-linux-android", " -march=i686"),
            "x86_64" => ("x86_64", "x86_64-linux-android", ""),
            other => {
                return Err(Error::ConfigParse {
                    message: format!("Unknown architecture '{}'", other),
                    hint: Some(format!("Known architectures: {}", KNOWN_ARCHS.join(", "))),
                })
            }
        };
        Ok(Self {
            name: name.to_string(),
            toolchain_prefix: toolchain_prefix.to_string(),
            command_prefix: command_prefix.to_string(),
            extra_cflags,
        })
    }

    /// Parse a list of names, rejecting unknown ones. A repeated name is
    /// kept once, at its first position.
    pub fn parse_list(names: &[String]) -> Result<Vec<Self>> {
        let mut archs: Vec<Self> = Vec::with_capacity(names.len());
        for name in names {
            if archs.iter().any(|a| &a.name == name) {
                continue;
            }
            archs.push(Self::from_name(name)?);
        }
        Ok(archs)
    }

    /// Build environment for commands targeting this architecture.
    pub fn env(&self, ctx: &Context) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("ARCH".to_string(), self.name.clone());
        env.insert(
            "CFLAGS".to_string(),
            format!("-DANDROID -fomit-frame-pointer{}", self.extra_cflags),
        );
        env.insert(
            "LDFLAGS".to_string(),
            format!("-L{}", ctx.libs_dir_path(self).display()),
        );
        env.insert("CC".to_string(), format!("{}-gcc", self.command_prefix));
        env.insert("CXX".to_string(), format!("{}-g++", self.command_prefix));
        env.insert("AR".to_string(), format!("{}-ar", self.command_prefix));
        env.insert("TOOLCHAIN_PREFIX".to_string(), self.toolchain_prefix.clone());
        for (key, value) in &ctx.env {
            env.insert(key.clone(), value.clone());
        }
        env
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
