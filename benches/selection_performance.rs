//! Performance benchmarks for probe sweeps and region selection

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use region_matchmaker::config::{RegionEntry, RegionsConfig};
use region_matchmaker::matchmaking::{build_endpoint, parse_color};
use region_matchmaker::region::{
    ProbeReport, ProbeResult, RegionProber, RegionRegistry, RegionSelection, SweepReport,
};
use region_matchmaker::settings::{InMemorySettingsStore, SettingKey, SettingValue};
use region_matchmaker::types::{GetGameResponse, RegionInfo, ServerInfo};
use std::sync::Arc;
use std::time::Duration;

// Transport answering instantly for benchmarks
#[derive(Debug, Clone)]
struct BenchTransport;

#[async_trait::async_trait]
impl region_matchmaker::RegionTransport for BenchTransport {
    async fn fetch_server_info(
        &self,
        region: &RegionInfo,
    ) -> region_matchmaker::error::Result<ServerInfo> {
        Ok(ServerInfo {
            protocol_version: 23,
            player_count: Some(region.address.len() as u32),
            max_team_size: None,
        })
    }

    async fn request_game(
        &self,
        _region: &RegionInfo,
    ) -> region_matchmaker::error::Result<GetGameResponse> {
        Ok(GetGameResponse::joined(1))
    }
}

fn bench_regions(count: usize) -> RegionsConfig {
    RegionsConfig {
        default_region: "r0".to_string(),
        regions: (0..count)
            .map(|i| {
                RegionEntry::new(
                    &format!("r{}", i),
                    &format!("Region {}", i),
                    &format!("r{}.bench", i),
                    true,
                )
            })
            .collect(),
    }
}

fn bench_sweep_report(count: usize) -> SweepReport {
    SweepReport {
        reports: (0..count)
            .map(|i| {
                let result = match i % 5 {
                    0 => ProbeResult::Failed {
                        reason: "timeout".to_string(),
                    },
                    1 => ProbeResult::VersionMismatch {
                        expected: 23,
                        actual: 22,
                    },
                    _ => ProbeResult::Available {
                        info: ServerInfo {
                            protocol_version: 23,
                            player_count: Some(i as u32),
                            max_team_size: None,
                        },
                        latency_ms: ((i * 37) % 200) as u64,
                    },
                };
                ProbeReport::new(format!("r{}", i), result)
            })
            .collect(),
    }
}

fn bench_merge_and_select(c: &mut Criterion) {
    let config = bench_regions(64);
    let sweep = bench_sweep_report(64);
    let settings = InMemorySettingsStore::new();

    c.bench_function("merge_and_select_64_regions", |b| {
        b.iter(|| {
            let mut registry = RegionRegistry::from_config(&config).unwrap();
            registry.apply_sweep(&sweep);

            let mut selection = RegionSelection::new();
            let selected = selection
                .select_best_or_default(&registry, &sweep, &settings)
                .map(|id| id.clone());
            black_box((selected, selection.list(&registry)))
        })
    });
}

fn bench_probe_sweep(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let registry = RegionRegistry::from_config(&bench_regions(16)).unwrap();
    let targets = registry.snapshot();
    let prober = RegionProber::new(Arc::new(BenchTransport), Duration::from_millis(2000), 23);

    c.bench_function("probe_sweep_16_regions", |b| {
        b.iter(|| rt.block_on(async { black_box(prober.sweep(&targets).await) }))
    });
}

fn bench_endpoint_building(c: &mut Criterion) {
    let region = RegionInfo::new("Europe", "eu.arena.example.com", true);
    let settings = InMemorySettingsStore::with_values([
        (SettingKey::DevPassword, SettingValue::from("pw")),
        (SettingKey::DevRole, SettingValue::from("admin")),
        (SettingKey::DevLobbyClearing, SettingValue::from(true)),
        (SettingKey::DevNameColor, SettingValue::from("rgb(12, 200, 99)")),
    ])
    .unwrap();

    c.bench_function("endpoint_with_overrides", |b| {
        b.iter(|| black_box(build_endpoint(&region, black_box(42), &settings)))
    });

    c.bench_function("parse_color", |b| {
        b.iter(|| black_box(parse_color(black_box("#1a2b3c"))))
    });
}

criterion_group!(
    benches,
    bench_merge_and_select,
    bench_probe_sweep,
    bench_endpoint_building
);
criterion_main!(benches);
