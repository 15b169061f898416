use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fibre_inject::{injectable, Container, RequestContext};
use std::sync::Arc;

// --- Fixtures ---

struct Config;
injectable!(Config);

struct Repository {
  _config: Arc<Config>,
}
injectable!(Repository { _config: Config });

struct Handler {
  _repository: Arc<Repository>,
  _config: Arc<Config>,
}
injectable!(Handler {
  _repository: Repository,
  _config: Config,
});

fn container() -> Container {
  let container = Container::new();
  container.add_exact_singleton::<Config>();
  container.add_exact_scoped::<Repository>();
  container.add_exact_transient::<Handler>();
  container
}

// --- Benchmark Functions ---

fn bench_scopes(c: &mut Criterion) {
  let container = container();
  let context = RequestContext::new();
  let resolver = container.create_resolver(&context);
  resolver.get::<Config>().unwrap();

  let mut group = c.benchmark_group("resolve");
  group.bench_function("singleton_cached", |b| b.iter(|| black_box(resolver.get::<Config>().unwrap())));
  group.bench_function("request_cached", |b| b.iter(|| black_box(resolver.get::<Repository>().unwrap())));
  group.bench_function("transient_graph", |b| b.iter(|| black_box(resolver.get::<Handler>().unwrap())));
  group.bench_function("fresh_request", |b| {
    b.iter(|| container.run_in_request(|resolver| black_box(resolver.get::<Handler>().unwrap())))
  });
  group.finish();
}

fn bench_hierarchy_depth(c: &mut Criterion) {
  let mut group = c.benchmark_group("parent_lookup");
  for depth in [1usize, 4, 16] {
    let root = container();
    let mut chain = vec![root];
    for _ in 0..depth {
      let child = chain[chain.len() - 1].create_child();
      chain.push(child);
    }
    let leaf = chain[chain.len() - 1].clone();
    let context = RequestContext::new();
    let resolver = leaf.create_resolver(&context);

    group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
      b.iter(|| black_box(resolver.get::<Config>().unwrap()))
    });
  }
  group.finish();
}

criterion_group!(benches, bench_scopes, bench_hierarchy_depth);
criterion_main!(benches);
