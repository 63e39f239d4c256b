//! Shared test infrastructure for integration tests.
//!
//! Builds a disposable world for the installer: a fake home, a murmur app
//! checkout, and stub collaborator executables on PATH that record every
//! invocation and keep their own state in marker files, so convergence can
//! be asserted without touching the real system or the network.
#![allow(dead_code)]

use sha2::{Digest, Sha256};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

pub const REQUIREMENTS: &str = "sounddevice==0.4.6\nnumpy==1.26.4\n";

const STUB_NAMES: &[(&str, &str)] = &[
    (
        "pacman",
        r#"#!/bin/sh
echo "pacman $*" >> "$STUB_LOG"
if [ "$1" = "-T" ]; then
  if [ -f "$STUB_STATE/missing_packages" ]; then cat "$STUB_STATE/missing_packages"; exit 1; fi
  exit 0
fi
exit 0
"#,
    ),
    (
        "sudo",
        r#"#!/bin/sh
echo "sudo $*" >> "$STUB_LOG"
exec "$@"
"#,
    ),
    (
        "git",
        r#"#!/bin/sh
echo "git $*" >> "$STUB_LOG"
if [ "$1" = "clone" ]; then
  for last; do :; done
  mkdir -p "$last/.git"
  exit 0
fi
if [ "$1" = "-C" ] && [ "$3" = "rev-parse" ]; then
  echo "3f2a9c1d7e5b4a6f8c0d2e4f6a8b0c1d2e3f4a5b"
  exit 0
fi
exit 0
"#,
    ),
    (
        "cmake",
        r#"#!/bin/sh
echo "cmake $*" >> "$STUB_LOG"
if [ -f "$STUB_STATE/cmake_fails" ]; then echo "configure failed" >&2; exit 1; fi
case "$*" in
  *GGML_VULKAN*) if [ -f "$STUB_STATE/vulkan_fails" ]; then echo "vulkan not found" >&2; exit 1; fi ;;
esac
prev=""
build_dir=""
mode=configure
for arg; do
  [ "$arg" = "--build" ] && mode=build
  [ "$prev" = "-B" ] && build_dir="$arg"
  [ "$prev" = "--build" ] && build_dir="$arg"
  prev="$arg"
done
if [ "$mode" = "build" ]; then
  mkdir -p "$build_dir/bin"
  printf '#!/bin/sh\nexit 0\n' > "$build_dir/bin/whisper-cli"
  chmod +x "$build_dir/bin/whisper-cli"
else
  mkdir -p "$build_dir"
fi
exit 0
"#,
    ),
    (
        "ldd",
        r#"#!/bin/sh
echo "ldd $*" >> "$STUB_LOG"
if [ -f "$STUB_STATE/no_vulkan" ]; then
  echo "	libc.so.6 => /usr/lib/libc.so.6 (0x0)"
else
  echo "	libvulkan.so.1 => /usr/lib/libvulkan.so.1 (0x0)"
  echo "	libc.so.6 => /usr/lib/libc.so.6 (0x0)"
fi
exit 0
"#,
    ),
    (
        "python3",
        r#"#!/bin/sh
echo "python3 $*" >> "$STUB_LOG"
if [ "$1" = "-m" ] && [ "$2" = "venv" ]; then
  mkdir -p "$3/bin"
  cat > "$3/bin/python" <<'EOF'
#!/bin/sh
echo "venv-python $*" >> "$STUB_LOG"
exit 0
EOF
  chmod +x "$3/bin/python"
  cat > "$3/bin/pip" <<'EOF'
#!/bin/sh
echo "pip $*" >> "$STUB_LOG"
exit 0
EOF
  chmod +x "$3/bin/pip"
fi
exit 0
"#,
    ),
    (
        "systemctl",
        r#"#!/bin/sh
echo "systemctl $*" >> "$STUB_LOG"
if [ "$2" = "is-enabled" ]; then
  if [ -f "$STUB_STATE/service_enabled" ]; then echo enabled; exit 0; fi
  echo disabled
  exit 1
fi
if [ "$2" = "enable" ]; then touch "$STUB_STATE/service_enabled"; fi
exit 0
"#,
    ),
    (
        "id",
        r#"#!/bin/sh
echo "id $*" >> "$STUB_LOG"
if [ "$1" = "-un" ]; then echo tester; exit 0; fi
if [ -f "$STUB_STATE/groups" ]; then cat "$STUB_STATE/groups"; else echo "tester wheel input"; fi
exit 0
"#,
    ),
    (
        "usermod",
        r#"#!/bin/sh
echo "usermod $*" >> "$STUB_LOG"
echo "tester wheel input" > "$STUB_STATE/groups"
exit 0
"#,
    ),
];

pub struct Fixture {
    root: TempDir,
}

impl Default for Fixture {
    fn default() -> Self {
        Fixture::new()
    }
}

impl Fixture {
    pub fn new() -> Fixture {
        let root = TempDir::new().expect("create fixture dir");
        let fixture = Fixture { root };

        fs::create_dir_all(fixture.bin_dir()).unwrap();
        fs::create_dir_all(fixture.stub_state_dir()).unwrap();
        fs::write(fixture.stub_log_path(), "").unwrap();
        for (name, script) in STUB_NAMES {
            fixture.write_stub(name, script);
        }

        let app = fixture.app_root();
        fs::create_dir_all(app.join("share")).unwrap();
        fs::write(app.join("requirements.txt"), REQUIREMENTS).unwrap();
        fs::write(
            app.join("share/murmur-waybar.jsonc"),
            "{\n  \"custom/murmur\": { \"exec\": \"murmur-toggle.sh status\" }\n}\n",
        )
        .unwrap();
        fs::write(
            app.join("share/murmur-hyprland.conf"),
            "bind = SUPER, D, exec, ~/.config/murmur/murmur-toggle.sh\n",
        )
        .unwrap();
        fs::write(
            app.join("share/murmur-toggle.sh"),
            "#!/bin/sh\nsystemctl --user kill -s SIGUSR1 murmur.service\n",
        )
        .unwrap();
        fs::write(
            app.join("share/murmur.service"),
            "[Unit]\nDescription=murmur dictation daemon\n\n[Service]\nExecStart=@VENV_PYTHON@ @APP_ROOT@/murmur.py\n\n[Install]\nWantedBy=default.target\n",
        )
        .unwrap();

        let hypr_dir = fixture.home().join(".config/hypr");
        fs::create_dir_all(&hypr_dir).unwrap();
        fs::write(hypr_dir.join("hyprland.conf"), "monitor=,preferred,auto,1\n").unwrap();

        fixture
    }

    pub fn home(&self) -> PathBuf {
        self.root.path().join("home")
    }

    pub fn app_root(&self) -> PathBuf {
        self.root.path().join("app")
    }

    fn bin_dir(&self) -> PathBuf {
        self.root.path().join("bin")
    }

    fn stub_state_dir(&self) -> PathBuf {
        self.root.path().join("stub-state")
    }

    fn stub_log_path(&self) -> PathBuf {
        self.root.path().join("stub.log")
    }

    fn write_stub(&self, name: &str, script: &str) {
        let path = self.bin_dir().join(name);
        fs::write(&path, script).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
    }

    /// Run the installer binary against this fixture's world.
    pub fn run(&self, args: &[&str]) -> Output {
        let home = self.home();
        let path = format!("{}:/usr/bin:/bin", self.bin_dir().display());
        Command::new(env!("CARGO_BIN_EXE_murmur-setup"))
            .args(["--app-root"])
            .arg(self.app_root())
            .args(args)
            .env("HOME", &home)
            .env("XDG_CONFIG_HOME", home.join(".config"))
            .env("XDG_DATA_HOME", home.join(".local/share"))
            .env("XDG_STATE_HOME", home.join(".local/state"))
            .env("XDG_CACHE_HOME", home.join(".cache"))
            .env("PATH", path)
            .env("STUB_LOG", self.stub_log_path())
            .env("STUB_STATE", self.stub_state_dir())
            .env("USER", "tester")
            .output()
            .expect("run murmur-setup")
    }

    pub fn stub_log(&self) -> String {
        fs::read_to_string(self.stub_log_path()).unwrap_or_default()
    }

    pub fn clear_stub_log(&self) {
        fs::write(self.stub_log_path(), "").unwrap();
    }

    pub fn set_stub_marker(&self, name: &str) {
        fs::write(self.stub_state_dir().join(name), "").unwrap();
    }

    pub fn state_path(&self) -> PathBuf {
        self.home().join(".local/state/murmur/install-state.json")
    }

    pub fn state_json(&self) -> serde_json::Value {
        let bytes = fs::read(self.state_path()).expect("read state document");
        serde_json::from_slice(&bytes).expect("parse state document")
    }

    pub fn state_value(&self, key: &str) -> String {
        self.state_json()[key].as_str().unwrap_or("").to_string()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.home().join(".local/share/murmur")
    }

    pub fn model_path(&self) -> PathBuf {
        self.data_dir().join("models/ggml-base.en.bin")
    }

    pub fn engine_binary(&self) -> PathBuf {
        self.data_dir().join("whisper.cpp/build/bin/whisper-cli")
    }

    pub fn venv_python(&self) -> PathBuf {
        self.data_dir().join("venv/bin/python")
    }

    pub fn waybar_module(&self) -> PathBuf {
        self.home().join(".config/waybar/murmur.jsonc")
    }

    pub fn hyprland_conf(&self) -> PathBuf {
        self.home().join(".config/hypr/hyprland.conf")
    }

    pub fn service_unit(&self) -> PathBuf {
        self.home().join(".config/systemd/user/murmur.service")
    }

    /// Place a model artifact on disk and record its digest in the state
    /// document, as a prior successful download would have.
    pub fn seed_valid_model(&self) {
        let path = self.model_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let bytes = b"ggml model bytes".to_vec();
        fs::write(&path, &bytes).unwrap();

        let state_path = self.state_path();
        fs::create_dir_all(state_path.parent().unwrap()).unwrap();
        let doc = serde_json::json!({ "model_digest": sha256_hex(&bytes) });
        fs::write(&state_path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn stdout_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Commands that mutate the machine; their absence from the stub log after a
/// run is what idempotence and dry-run purity mean here.
pub const MUTATING_LOG_PATTERNS: &[&str] = &[
    "pacman -S",
    "git clone",
    "cmake",
    "python3 -m venv",
    "pip install",
    "usermod",
    "enable --now",
];

pub fn assert_no_mutations(log: &str) {
    for pattern in MUTATING_LOG_PATTERNS {
        assert!(
            !log.contains(pattern),
            "expected no `{pattern}` in stub log, got:\n{log}"
        );
    }
}
