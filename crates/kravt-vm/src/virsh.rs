//! Hypervisor backend driving the `virsh` command-line client.

use crate::descriptor::DomainDescriptor;
use crate::error::{Result, VmError};
use crate::hypervisor::{DomainHandle, Hypervisor};
use crate::state::DomainState;
use async_trait::async_trait;
use std::ffi::OsStr;
use std::io::Write;
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Default `virsh` executable, resolved through `PATH`.
pub const DEFAULT_VIRSH_PROGRAM: &str = "virsh";

#[derive(Debug, Clone)]
struct Virsh {
    program: String,
    uri: String,
}

impl Virsh {
    async fn output<I, S>(&self, args: I) -> std::io::Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--connect")
            .arg(&self.uri)
            .args(args)
            .stdin(Stdio::null());
        tracing::trace!(?cmd, "Running virsh");
        cmd.output().await
    }

    /// Run a subcommand against `domain`, returning its stdout.
    async fn run<I, S>(&self, op: &'static str, domain: &str, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.output(args).await.map_err(|e| {
            VmError::hypervisor(op, domain, format!("failed to run {}: {e}", self.program))
        })?;
        if !output.status.success() {
            return Err(VmError::hypervisor(op, domain, failure_message(&output)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("virsh exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

/// A `virsh`-backed connection.
#[derive(Debug, Clone)]
pub struct VirshHypervisor {
    virsh: Virsh,
}

impl VirshHypervisor {
    /// Check that `virsh` can reach the hypervisor at `uri`.
    ///
    /// # Errors
    /// Returns `VmError::Connection` if `virsh` cannot be run or the URI is
    /// unreachable.
    pub async fn connect(program: impl Into<String>, uri: impl Into<String>) -> Result<Self> {
        let virsh = Virsh {
            program: program.into(),
            uri: uri.into(),
        };
        tracing::debug!(program = %virsh.program, uri = %virsh.uri, "Connecting via virsh");

        let output = virsh
            .output(["uri"])
            .await
            .map_err(|e| VmError::Connection {
                uri: virsh.uri.clone(),
                message: format!("failed to run {}: {e}", virsh.program),
            })?;
        if !output.status.success() {
            return Err(VmError::Connection {
                uri: virsh.uri.clone(),
                message: failure_message(&output),
            });
        }

        Ok(Self { virsh })
    }

    pub fn uri(&self) -> &str {
        &self.virsh.uri
    }

    fn domain(&self, name: &str) -> VirshDomain {
        VirshDomain {
            name: name.to_string(),
            virsh: self.virsh.clone(),
        }
    }
}

#[async_trait(?Send)]
impl Hypervisor for VirshHypervisor {
    type Domain = VirshDomain;

    async fn define_xml(&self, xml: &str) -> Result<VirshDomain> {
        let name = DomainDescriptor::from_xml(xml)?.name;

        // Removed when `file` drops, whichever way this returns.
        let mut file = tempfile::Builder::new()
            .prefix("kravt-")
            .suffix(".xml")
            .tempfile()?;
        file.write_all(xml.as_bytes())?;
        file.flush()?;

        self.virsh
            .run("define", &name, [OsStr::new("define"), file.path().as_os_str()])
            .await?;
        tracing::debug!(domain = %name, "Domain defined");
        Ok(self.domain(&name))
    }

    async fn lookup_by_name(&self, name: &str) -> Result<VirshDomain> {
        self.virsh.run("look up", name, ["domuuid", name]).await?;
        Ok(self.domain(name))
    }
}

/// A domain addressed by name through `virsh`.
#[derive(Debug, Clone)]
pub struct VirshDomain {
    name: String,
    virsh: Virsh,
}

#[async_trait(?Send)]
impl DomainHandle for VirshDomain {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<()> {
        self.virsh
            .run("start", &self.name, ["start", self.name.as_str()])
            .await?;
        Ok(())
    }

    async fn destroy(&self) -> Result<()> {
        self.virsh
            .run("destroy", &self.name, ["destroy", self.name.as_str()])
            .await?;
        Ok(())
    }

    async fn undefine(&self) -> Result<()> {
        self.virsh
            .run("undefine", &self.name, ["undefine", self.name.as_str()])
            .await?;
        Ok(())
    }

    async fn state(&self) -> Result<DomainState> {
        let out = self
            .virsh
            .run("query", &self.name, ["domstate", self.name.as_str()])
            .await?;
        Ok(DomainState::from_virsh(&out))
    }

    async fn xml_desc(&self) -> Result<String> {
        self.virsh
            .run("describe", &self.name, ["dumpxml", self.name.as_str()])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `true` and `false` stand in for a virsh that always succeeds or fails.

    #[tokio::test]
    async fn test_connect_missing_program() {
        let err = VirshHypervisor::connect("/nonexistent/virsh", "qemu:///system")
            .await
            .unwrap_err();
        match err {
            VmError::Connection { uri, message } => {
                assert_eq!(uri, "qemu:///system");
                assert!(message.contains("/nonexistent/virsh"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_connect_unreachable() {
        let err = VirshHypervisor::connect("false", "qemu:///system")
            .await
            .unwrap_err();
        assert!(matches!(err, VmError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_commands_succeed() {
        let hv = VirshHypervisor::connect("true", "test:///default").await.unwrap();
        assert_eq!(hv.uri(), "test:///default");

        let dom = hv
            .define_xml("<domain type='kvm'><name>vm1</name></domain>")
            .await
            .unwrap();
        assert_eq!(dom.name(), "vm1");

        let dom = hv.lookup_by_name("vm1").await.unwrap();
        dom.start().await.unwrap();
        // No output means nothing recognisable.
        assert_eq!(dom.state().await.unwrap(), DomainState::Unknown);
    }

    #[tokio::test]
    async fn test_define_rejects_unparseable_xml() {
        let hv = VirshHypervisor::connect("true", "test:///default").await.unwrap();
        let err = hv.define_xml("<domain/>").await.unwrap_err();
        assert!(matches!(err, VmError::Xml(_)));
    }

    #[tokio::test]
    async fn test_command_failure_names_domain() {
        let dom = VirshDomain {
            name: "vm1".into(),
            virsh: Virsh {
                program: "false".into(),
                uri: "test:///default".into(),
            },
        };
        let err = dom.undefine().await.unwrap_err();
        match err {
            VmError::Hypervisor { op, domain, message } => {
                assert_eq!(op, "undefine");
                assert_eq!(domain, "vm1");
                assert!(message.contains("exit"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
