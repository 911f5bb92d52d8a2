/// Benchmarks for permission decisions
///
/// Measures performance of:
/// - Role mode decisions with growing role fan-out
/// - Scope mode decisions (exact and glob lookups)
/// - Glob matching

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mcpgate_authz::matcher::glob_match;
use mcpgate_authz::policy::{ScopeConfig, ScopeMode, ScopePermission};
use mcpgate_authz::{
    AttributeToRoles, ClaimSet, EngineConfig, InMemoryDirectoryStore, ObjectType, PermissionDecider,
    PermissionEntry, PolicyKind, Role,
};
use std::sync::Arc;
use tokio::runtime::Runtime;

async fn role_decider(role_count: usize) -> PermissionDecider {
    let store = InMemoryDirectoryStore::new();
    let mut names = Vec::with_capacity(role_count);

    for i in 0..role_count {
        let name = format!("role-{}", i);
        let role = Role::new(&name)
            .with_permission(PermissionEntry::new(ObjectType::Tools, "*", format!("tool-{}", i)));
        store.set_role(role).await.unwrap();
        names.push(name);
    }
    store
        .set_attribute_to_roles(AttributeToRoles::new("groups", "bench", names))
        .await
        .unwrap();

    let config = EngineConfig {
        enable_metrics: false,
        ..Default::default()
    };
    PermissionDecider::new(config, Arc::new(store)).unwrap()
}

fn scope_decider() -> PermissionDecider {
    let mut permissions: Vec<_> = (0..50)
        .map(|i| ScopePermission::new(format!("proxy-{}:tool", i), vec!["tools:read".to_string()]))
        .collect();
    permissions.push(ScopePermission::new("github:*", vec!["tools:read".to_string()]));

    let config = EngineConfig {
        policy: PolicyKind::Scope,
        scope: ScopeConfig {
            mode: ScopeMode::Any,
            default_scope: None,
            mappings: [("groups:bench".to_string(), vec!["tools:read".to_string()])]
                .into_iter()
                .collect(),
            permissions,
        },
        enable_metrics: false,
    };

    PermissionDecider::new(config, Arc::new(InMemoryDirectoryStore::new())).unwrap()
}

fn bench_role_decisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("role_decision");
    let rt = Runtime::new().unwrap();
    let claims = ClaimSet::new().with_claim("groups", vec!["bench"]);

    for role_count in [1usize, 10, 50] {
        let decider = rt.block_on(role_decider(role_count));
        let last_tool = format!("tool-{}", role_count - 1);

        group.bench_with_input(BenchmarkId::from_parameter(role_count), &role_count, |b, _| {
            b.to_async(&rt).iter(|| async {
                let allowed = decider
                    .verify_permissions(black_box(&claims), "tools", "github", &last_tool)
                    .await;
                black_box(allowed);
            });
        });
    }

    group.finish();
}

fn bench_scope_decisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("scope_decision");
    let rt = Runtime::new().unwrap();
    let decider = scope_decider();
    let claims = ClaimSet::new().with_claim("groups", vec!["bench"]);

    group.bench_function("exact_pattern", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(decider.verify_permissions(&claims, "tools", "proxy-25", "tool").await);
        });
    });

    group.bench_function("glob_pattern", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(decider.verify_permissions(&claims, "tools", "github", "search").await);
        });
    });

    group.finish();
}

fn bench_glob_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("glob_matching");

    let cases = vec![
        ("star", "github:*", "github:create_issue"),
        ("class", "github:[a-c]*_issue", "github:create_issue"),
        ("miss", "jira:*", "github:create_issue"),
    ];

    for (name, pattern, action) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &(pattern, action), |b, &(p, a)| {
            b.iter(|| glob_match(black_box(p), black_box(a)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_role_decisions,
    bench_scope_decisions,
    bench_glob_matching
);
criterion_main!(benches);
