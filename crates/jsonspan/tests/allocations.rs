#![expect(missing_docs)]

use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
};

use jsonspan::{Tokenizer, TokenizerPool};

/// Counts allocations made by the current thread.
struct Counting;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

fn bump() {
    let _ = ALLOCATIONS.try_with(|count| count.set(count.get() + 1));
}

// SAFETY: forwards every call to `System` unchanged.
unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        bump();
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        bump();
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

fn count_allocations<T>(f: impl FnOnce() -> T) -> (T, usize) {
    let before = ALLOCATIONS.with(Cell::get);
    let out = f();
    (out, ALLOCATIONS.with(Cell::get) - before)
}

fn uniform_array(count: usize) -> String {
    let mut out = String::with_capacity(count * 48);
    out.push('[');
    for i in 0..count {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!(
            r#"{{"id":{i},"name":"item-{}","active":{}}}"#,
            i % 97,
            i % 2 == 0
        ));
    }
    out.push(']');
    out
}

#[test]
fn tokenizing_allocates_far_less_than_a_value_tree() {
    let input = uniform_array(100_000);

    let mut tokenizer = Tokenizer::default();
    let (len, tokenizer_allocs) = count_allocations(|| {
        let stream = tokenizer.parse(input.as_bytes()).unwrap();
        stream.len()
    });
    assert_eq!(len, 100_000 * 14 + 1);

    let (value, tree_allocs) =
        count_allocations(|| serde_json::from_slice::<serde_json::Value>(input.as_bytes()).unwrap());
    assert_eq!(value.as_array().map(Vec::len), Some(100_000));

    // The token buffer is reserved once, plus the container stack.
    assert!(tokenizer_allocs <= 2, "tokenizer made {tokenizer_allocs} allocations");
    assert!(
        tokenizer_allocs * 10 <= tree_allocs,
        "tokenizer: {tokenizer_allocs}, value tree: {tree_allocs}"
    );
}

#[test]
fn reused_tokenizer_does_not_allocate() {
    let input = uniform_array(20_000);
    let mut tokenizer = Tokenizer::default();
    tokenizer.parse(input.as_bytes()).unwrap();

    let ((), allocs) = count_allocations(|| {
        tokenizer.parse(input.as_bytes()).unwrap();
        tokenizer.parse(br#"{"small":[1,2,3]}"#).unwrap();
    });
    assert_eq!(allocs, 0);
}

#[test]
fn pooled_tokenizer_is_reused_without_allocating() {
    let input = uniform_array(5_000);
    let pool = TokenizerPool::default();

    let ((), first) = count_allocations(|| {
        let mut tokenizer = pool.lease();
        tokenizer.parse(input.as_bytes()).unwrap();
    });
    assert!(first > 0);

    let ((), second) = count_allocations(|| {
        let mut tokenizer = pool.lease();
        tokenizer.parse(input.as_bytes()).unwrap();
    });
    assert_eq!(second, 0);
    assert_eq!(pool.stats().created, 1);
}

#[test]
fn lexemes_are_borrowed_not_copied() {
    let input = uniform_array(1_000);
    let mut tokenizer = Tokenizer::default();
    let stream = tokenizer.parse(input.as_bytes()).unwrap();

    let (names, allocs) = count_allocations(|| {
        stream
            .elements()
            .filter_map(|e| e.field("name")?.first_str()?.decode().ok())
            .filter(|name| matches!(name, std::borrow::Cow::Borrowed(_)))
            .count()
    });
    assert_eq!(names, 1_000);
    assert_eq!(allocs, 0);
}
