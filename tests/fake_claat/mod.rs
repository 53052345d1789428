use std::os::unix::fs::PermissionsExt as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail { code: i32, message: &'static str },
    RateLimitFirst(u32),
    NestedOutput,
}

/// Shell script standing in for `claat export -o <dir> <id>`.
///
/// Every call appends the document id to a log so tests can assert on the
/// order and number of invocations.
pub struct FakeClaat {
    pub bin: PathBuf,
    calls: PathBuf,
}

#[allow(dead_code)]
impl FakeClaat {
    pub fn install(dir: &Path, behavior: Behavior) -> anyhow::Result<Self> {
        let bin = dir.join("fake-claat");
        let calls = dir.join("claat-calls.log");

        let (on_call, out_suffix) = match behavior {
            Behavior::Succeed => (String::new(), ""),
            Behavior::Fail { code, message } => (format!("echo '{message}' >&2\nexit {code}"), ""),
            Behavior::RateLimitFirst(n) => (
                format!(
                    "if [ \"$n\" -le {n} ]; then\n  echo 'googleapi: Error 429: Too Many Requests' >&2\n  exit 1\nfi"
                ),
                "",
            ),
            Behavior::NestedOutput => (String::new(), "/nested"),
        };

        let script = format!(
            r#"#!/bin/sh
set -e
if [ "$1" != export ] || [ "$2" != -o ]; then
  echo "unexpected args: $*" >&2
  exit 64
fi
out="$3"
id="$4"
echo "$id" >> '{calls}'
n=$(wc -l < '{calls}')
{on_call}
mkdir -p "$out{out_suffix}"
printf '<html>\n<head>\n<title>%s</title>\n</head>\n<body></body>\n</html>\n' "$id" > "$out{out_suffix}/index.html"
echo "exported $id"
"#,
            calls = calls.display(),
        );

        std::fs::write(&bin, script).with_context(|| format!("write {}", bin.display()))?;
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755))
            .with_context(|| format!("chmod {}", bin.display()))?;

        Ok(Self { bin, calls })
    }

    pub fn bin_arg(&self) -> &str {
        self.bin.to_str().expect("fake claat path is UTF-8")
    }

    pub fn calls(&self) -> anyhow::Result<Vec<String>> {
        if !self.calls.exists() {
            return Ok(Vec::new());
        }
        let log = std::fs::read_to_string(&self.calls)?;
        Ok(log.lines().map(str::to_owned).collect())
    }
}
