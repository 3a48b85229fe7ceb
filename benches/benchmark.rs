use std::{ops::Deref, rc::Rc, sync::Arc, thread};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shptr::SharedPtr;

//cargo install cargo-criterion
//cargo criterion

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("Clone SharedPtr", |b| b.iter(clone_shptr));
    c.bench_function("Clone Arc", |b| b.iter(clone_arc));
    c.bench_function("Clone Rc", |b| b.iter(clone_rc));
    c.bench_function("Multiple clone SharedPtr", |b| b.iter(multi_clone_shptr));
    c.bench_function("Multiple clone Arc", |b| b.iter(multi_clone_arc));
    c.bench_function("Multiple clone Rc", |b| b.iter(multi_clone_rc));
    c.bench_function("Deref SharedPtr", |b| b.iter(deref_shptr));
    c.bench_function("Deref Arc", |b| b.iter(deref_arc));
    c.bench_function("Deref Rc", |b| b.iter(deref_rc));
    c.bench_function("Multiple deref SharedPtr", |b| b.iter(multi_deref_shptr));
    c.bench_function("Multiple deref Arc", |b| b.iter(multi_deref_arc));
    c.bench_function("Multiple deref Rc", |b| b.iter(multi_deref_rc));
    c.bench_function("Multiple threads SharedPtr", |b| b.iter(multi_thread_shptr));
    c.bench_function("Multiple threads Arc", |b| b.iter(multi_thread_arc));
}

fn clone_shptr() {
    let ptr = SharedPtr::new(100);
    let _ = black_box(SharedPtr::clone(&ptr));
}

fn clone_arc() {
    let arc = Arc::new(100);
    let _ = black_box(Arc::clone(&arc));
}

fn clone_rc() {
    let rc = Rc::new(100);
    let _ = black_box(Rc::clone(&rc));
}

fn multi_clone_shptr() {
    let ptr = SharedPtr::new(100);
    for _ in 0..100 {
        let _ = black_box(ptr.clone());
    }
}

fn multi_clone_arc() {
    let arc = Arc::new(100);
    for _ in 0..100 {
        let _ = black_box(arc.clone());
    }
}

fn multi_clone_rc() {
    let rc = Rc::new(100);
    for _ in 0..100 {
        let _ = black_box(rc.clone());
    }
}

fn deref_shptr() {
    let ptr = SharedPtr::new(100);
    let _ = black_box(ptr.deref());
}

fn deref_arc() {
    let arc = Arc::new(100);
    let _ = black_box(arc.deref());
}

fn deref_rc() {
    let rc = Rc::new(100);
    let _ = black_box(rc.deref());
}

fn multi_deref_shptr() {
    let ptr = SharedPtr::new(100);
    for _ in 0..100 {
        let _ = black_box(ptr.deref());
    }
}

fn multi_deref_arc() {
    let arc = Arc::new(100);
    for _ in 0..100 {
        let _ = black_box(arc.deref());
    }
}

fn multi_deref_rc() {
    let rc = Rc::new(100);
    for _ in 0..100 {
        let _ = black_box(rc.deref());
    }
}

fn multi_thread_shptr() {
    let ptr = SharedPtr::new(100);
    for _ in 0..100 {
        let ptr2 = ptr.clone();
        thread::spawn(move || {
            let mut sum = 0;
            for _ in 0..1000 {
                let p = ptr2.clone();
                sum += *p;
            }
            sum
        })
        .join()
        .unwrap();
    }
}

fn multi_thread_arc() {
    let arc = Arc::new(100);
    for _ in 0..100 {
        let arc2 = arc.clone();
        thread::spawn(move || {
            let mut sum = 0;
            for _ in 0..1000 {
                let a = arc2.clone();
                sum += *a;
            }
            sum
        })
        .join()
        .unwrap();
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
