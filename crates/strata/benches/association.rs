use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use strata::mapping::{AssociationKind, ClassDefinition, FieldType};
use strata::{map, Db, ResultItem, Value};
use strata_driver_sqlite::Sqlite;

fn setup_database_and_data(users: usize, posts_per_user: usize) -> Db {
    let mut builder = Db::builder();
    builder
        .register(
            ClassDefinition::entity("User")
                .id("id", FieldType::Integer)
                .field("name", FieldType::String)
                .association(map! {
                    "type" => AssociationKind::OneToMany.code(),
                    "fieldName" => "posts",
                    "targetEntity" => "Post",
                    "mappedBy" => "user",
                    "cascade" => vec![Value::from("persist")],
                }),
        )
        .register(
            ClassDefinition::entity("Post")
                .id("id", FieldType::Integer)
                .field("title", FieldType::String)
                .association(map! {
                    "type" => AssociationKind::ManyToOne.code(),
                    "fieldName" => "user",
                    "targetEntity" => "User",
                    "inversedBy" => "posts",
                }),
        );

    let mut db = builder.build(Sqlite::in_memory()).unwrap();
    db.push_schema().unwrap();

    for i in 0..users {
        let user = db.create("User").unwrap();
        db.set(user, "name", format!("User {i}")).unwrap();

        for j in 0..posts_per_user {
            let post = db.create("Post").unwrap();
            db.set(post, "title", format!("Post {j} for User {i}")).unwrap();
            db.set_reference(post, "user", Some(user)).unwrap();
            db.add_to_collection(user, "posts", post).unwrap();
        }

        db.persist(user).unwrap();
    }

    db.flush().unwrap();
    db.clear();
    db
}

fn association_benchmarks(c: &mut Criterion) {
    let sizes = [(50, 10), (100, 20), (200, 25)];

    let mut group = c.benchmark_group("association_performance_sqlite");
    group.sample_size(10);

    for (users, posts) in sizes {
        let size_label = format!("{users}u_{posts}p");
        let mut db = setup_database_and_data(users, posts);

        group.bench_with_input(
            BenchmarkId::new("fetch_join_one_to_many", &size_label),
            &size_label,
            |b, _| {
                b.iter(|| {
                    db.clear();
                    let users = db
                        .create_query("SELECT u, p FROM User u JOIN u.posts p")
                        .get_result()
                        .unwrap();
                    black_box(users.iter().filter_map(ResultItem::as_entity).count())
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("lazy_one_to_many", &size_label),
            &size_label,
            |b, _| {
                b.iter(|| {
                    db.clear();
                    let users = db.create_query("SELECT u FROM User u").get_result().unwrap();
                    for user in users.iter().filter_map(ResultItem::as_entity) {
                        db.initialize_collection(user, "posts").unwrap();
                    }
                    black_box(users.len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, association_benchmarks);
criterion_main!(benches);
