use std::panic;
use std::thread;

/// Apply `f` to every item on up to `workers` scoped threads.
///
/// Results come back in input order whatever order the workers finish in.
/// A panic inside `f` is re-raised on the calling thread.
pub(crate) fn map_ordered<T, R, F>(items: &[T], workers: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    let workers = workers.max(1).min(items.len());
    if workers <= 1 {
        return items.iter().map(&f).collect();
    }

    let chunk_size = items.len().div_ceil(workers);
    let f = &f;

    thread::scope(|scope| {
        let handles: Vec<_> = items
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || chunk.iter().map(f).collect::<Vec<R>>()))
            .collect();

        let mut results = Vec::with_capacity(items.len());
        for handle in handles {
            match handle.join() {
                Ok(chunk) => results.extend(chunk),
                Err(payload) => panic::resume_unwind(payload),
            }
        }
        results
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_input_order() {
        let items: Vec<u64> = (0..1000).collect();
        let doubled = map_ordered(&items, 8, |n| n * 2);
        assert_eq!(doubled, items.iter().map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_sequential_and_empty() {
        let items = vec!["a", "b"];
        assert_eq!(map_ordered(&items, 1, |s| s.len()), vec![1, 1]);
        assert_eq!(map_ordered(&items, 0, |s| s.to_uppercase()), vec!["A", "B"]);

        let empty: Vec<i32> = Vec::new();
        assert!(map_ordered(&empty, 4, |n| *n).is_empty());
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn test_worker_panic_propagates() {
        let items: Vec<i32> = (0..16).collect();
        map_ordered(&items, 4, |n| {
            if *n == 11 {
                panic!("boom");
            }
            *n
        });
    }
}
