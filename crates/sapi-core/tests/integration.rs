//! Integration tests for sapi-core.
//!
//! The inventory is driven through a scripted hypervisor that records every
//! connection and domain handle it hands out, so release on every exit path
//! can be checked without a libvirt daemon.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sapi_core::vm::MEMORY_STAT_ACTUAL_BALLOON;
use sapi_core::{
    DomainHandle, DomainStatus, ErrorKind, Hypervisor, HypervisorError, HypervisorSession,
    MemoryStat, list_virtual_machines, parse_key_values, read_disk_usage, read_os_release,
};

#[derive(Default)]
struct Counters {
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
    handles_opened: AtomicUsize,
    handles_freed: AtomicUsize,
}

impl Counters {
    fn assert_all_released(&self) {
        assert_eq!(
            self.sessions_opened.load(Ordering::SeqCst),
            self.sessions_closed.load(Ordering::SeqCst),
            "every connection must be closed"
        );
        assert_eq!(
            self.handles_opened.load(Ordering::SeqCst),
            self.handles_freed.load(Ordering::SeqCst),
            "every domain handle must be freed"
        );
    }
}

#[derive(Clone)]
struct ScriptedDomain {
    name: Option<String>,
    state: Option<u32>,
    max_memory_kib: Option<u64>,
    stats: Option<Vec<MemoryStat>>,
    vcpus: Option<u32>,
}

impl ScriptedDomain {
    fn healthy(name: &str, state: u32, max_kib: u64, balloon_kib: u64, vcpus: u32) -> Self {
        Self {
            name: Some(name.to_string()),
            state: Some(state),
            max_memory_kib: Some(max_kib),
            stats: Some(vec![
                MemoryStat { tag: 0, val: 12 },
                MemoryStat {
                    tag: MEMORY_STAT_ACTUAL_BALLOON,
                    val: balloon_kib,
                },
            ]),
            vcpus: Some(vcpus),
        }
    }
}

fn scripted<T: Clone>(value: &Option<T>, query: &str) -> Result<T, HypervisorError> {
    value
        .clone()
        .ok_or_else(|| HypervisorError::new(format!("{query} failed")))
}

struct ScriptedHandle {
    domain: ScriptedDomain,
    counters: Arc<Counters>,
}

impl DomainHandle for ScriptedHandle {
    fn name(&self) -> Result<String, HypervisorError> {
        scripted(&self.domain.name, "name")
    }
    fn state(&self) -> Result<u32, HypervisorError> {
        scripted(&self.domain.state, "state")
    }
    fn max_memory_kib(&self) -> Result<u64, HypervisorError> {
        scripted(&self.domain.max_memory_kib, "max memory")
    }
    fn memory_stats(&self) -> Result<Vec<MemoryStat>, HypervisorError> {
        scripted(&self.domain.stats, "memory stats")
    }
    fn vcpu_count(&self) -> Result<u32, HypervisorError> {
        scripted(&self.domain.vcpus, "info")
    }
}

impl Drop for ScriptedHandle {
    fn drop(&mut self) {
        self.counters.handles_freed.fetch_add(1, Ordering::SeqCst);
    }
}

struct ScriptedSession {
    domains: Option<Vec<ScriptedDomain>>,
    counters: Arc<Counters>,
}

impl HypervisorSession for ScriptedSession {
    fn list_domains(&self) -> Result<Vec<Box<dyn DomainHandle + '_>>, HypervisorError> {
        let domains = scripted(&self.domains, "list")?;
        Ok(domains
            .into_iter()
            .map(|domain| {
                self.counters.handles_opened.fetch_add(1, Ordering::SeqCst);
                Box::new(ScriptedHandle {
                    domain,
                    counters: self.counters.clone(),
                }) as Box<dyn DomainHandle + '_>
            })
            .collect())
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.counters.sessions_closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct ScriptedHypervisor {
    reachable: bool,
    domains: Option<Vec<ScriptedDomain>>,
    counters: Arc<Counters>,
}

impl ScriptedHypervisor {
    fn with_domains(domains: Vec<ScriptedDomain>) -> Self {
        Self {
            reachable: true,
            domains: Some(domains),
            counters: Arc::default(),
        }
    }
}

impl Hypervisor for ScriptedHypervisor {
    fn uri(&self) -> &str {
        "test:///scripted"
    }

    fn connect(&self) -> Result<Box<dyn HypervisorSession>, HypervisorError> {
        if !self.reachable {
            return Err(HypervisorError::new("connection refused"));
        }
        self.counters.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            domains: self.domains.clone(),
            counters: self.counters.clone(),
        }))
    }
}

#[test]
fn lists_every_domain_in_enumeration_order() {
    let hv = ScriptedHypervisor::with_domains(vec![
        ScriptedDomain::healthy("alpha", 1, 2_097_152, 1_048_576, 2),
        ScriptedDomain::healthy("beta", 5, 1_048_576, 0, 1),
        ScriptedDomain::healthy("gamma", 3, 8_388_608, 4_194_304, 8),
    ]);

    let vms = list_virtual_machines(&hv).unwrap();
    let names: Vec<&str> = vms.iter().map(|vm| vm.name.as_str()).collect();
    assert_eq!(names, ["alpha", "beta", "gamma"]);

    assert_eq!(vms[0].status, DomainStatus::Running);
    assert_eq!(vms[0].cpu_usage, 2);
    assert_eq!(vms[0].memory_total_mb, 2048);
    assert_eq!(vms[0].memory_used_mb, 1024);
    assert_eq!(vms[1].status, DomainStatus::Shutoff);
    assert_eq!(vms[2].status, DomainStatus::Paused);
    assert_eq!(vms[2].memory_used_mb, 4096);

    hv.counters.assert_all_released();
    assert_eq!(hv.counters.sessions_opened.load(Ordering::SeqCst), 1);
    assert_eq!(hv.counters.handles_freed.load(Ordering::SeqCst), 3);
}

#[test]
fn failed_detail_queries_keep_the_record() {
    let mut broken = ScriptedDomain::healthy("broken", 1, 2_097_152, 1_048_576, 4);
    broken.max_memory_kib = None;
    broken.stats = None;
    broken.vcpus = None;

    let hv = ScriptedHypervisor::with_domains(vec![
        ScriptedDomain::healthy("a", 1, 1024, 1024, 1),
        broken,
        ScriptedDomain::healthy("c", 1, 1024, 1024, 1),
    ]);

    let vms = list_virtual_machines(&hv).unwrap();
    assert_eq!(vms.len(), 3);
    let vm = &vms[1];
    assert_eq!(vm.name, "broken");
    // state query succeeded, so status is still known
    assert_eq!(vm.status, DomainStatus::Running);
    assert_eq!(vm.cpu_usage, 0);
    assert_eq!(vm.memory_total_mb, 0);
    assert_eq!(vm.memory_used_mb, 0);
    hv.counters.assert_all_released();
}

#[test]
fn failed_state_query_is_unknown() {
    let mut domain = ScriptedDomain::healthy("flaky", 1, 2048, 1024, 1);
    domain.state = None;
    let hv = ScriptedHypervisor::with_domains(vec![domain]);

    let vms = list_virtual_machines(&hv).unwrap();
    assert_eq!(vms[0].status, DomainStatus::Unknown);
    assert_eq!(vms[0].memory_total_mb, 2);
    assert_eq!(vms[0].memory_used_mb, 1);
}

#[test]
fn every_query_failing_still_yields_a_record() {
    let hv = ScriptedHypervisor::with_domains(vec![ScriptedDomain {
        name: None,
        state: None,
        max_memory_kib: None,
        stats: None,
        vcpus: None,
    }]);

    let vms = list_virtual_machines(&hv).unwrap();
    assert_eq!(vms.len(), 1);
    assert_eq!(vms[0].name, "");
    assert_eq!(vms[0].status, DomainStatus::Unknown);
    assert_eq!(vms[0].cpu_usage, 0);
    hv.counters.assert_all_released();
}

#[test]
fn stats_without_balloon_report_zero_used() {
    let mut domain = ScriptedDomain::healthy("nob", 1, 4096, 0, 1);
    domain.stats = Some(vec![MemoryStat { tag: 4, val: 9999 }]);
    let hv = ScriptedHypervisor::with_domains(vec![domain]);

    let vms = list_virtual_machines(&hv).unwrap();
    assert_eq!(vms[0].memory_total_mb, 4);
    assert_eq!(vms[0].memory_used_mb, 0);
}

#[test]
fn unreachable_hypervisor_is_upstream_unavailable() {
    let hv = ScriptedHypervisor {
        reachable: false,
        domains: Some(vec![ScriptedDomain::healthy("x", 1, 1, 1, 1)]),
        counters: Arc::default(),
    };

    let err = list_virtual_machines(&hv).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(err.to_string().contains("test:///scripted"));
    assert_eq!(hv.counters.handles_opened.load(Ordering::SeqCst), 0);
    hv.counters.assert_all_released();
}

#[test]
fn enumeration_failure_closes_connection() {
    let hv = ScriptedHypervisor {
        reachable: true,
        domains: None,
        counters: Arc::default(),
    };

    let err = list_virtual_machines(&hv).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert_eq!(hv.counters.sessions_opened.load(Ordering::SeqCst), 1);
    hv.counters.assert_all_released();
}

#[test]
fn empty_inventory_is_an_empty_list() {
    let hv = ScriptedHypervisor::with_domains(Vec::new());
    let vms = list_virtual_machines(&hv).unwrap();
    assert!(vms.is_empty());
    hv.counters.assert_all_released();
}

#[test]
fn each_call_opens_its_own_connection() {
    let hv = ScriptedHypervisor::with_domains(vec![ScriptedDomain::healthy("a", 1, 1, 1, 1)]);
    for _ in 0..3 {
        list_virtual_machines(&hv).unwrap();
    }
    assert_eq!(hv.counters.sessions_opened.load(Ordering::SeqCst), 3);
    hv.counters.assert_all_released();
}

#[test]
fn os_release_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("os-release");
    std::fs::write(&path, "FOO=bar\n# comment\nBAZ=a=b\n\nEMPTY\n").unwrap();

    let release = read_os_release(&path).unwrap();
    assert_eq!(release, parse_key_values("FOO=bar\nBAZ=a=b\n"));
    assert_eq!(release.len(), 2);
}

#[cfg(unix)]
#[test]
fn disk_usage_of_temp_dir() {
    let dir = tempfile::tempdir().unwrap();
    let usage = read_disk_usage(dir.path()).unwrap();
    assert!(usage.total_bytes > 0);
    assert!(usage.used_percent.is_finite());
}
