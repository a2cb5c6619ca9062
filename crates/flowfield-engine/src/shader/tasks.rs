use std::collections::VecDeque;

type Task = Box<dyn FnOnce()>;

/// Closures deferred to the next frame boundary.
///
/// Single-threaded by construction (`!Send` closures): only the render thread
/// pushes and drains. Each queued closure runs at most once, in insertion order.
#[derive(Default)]
pub struct FrameTaskQueue {
    tasks: VecDeque<Task>,
}

impl FrameTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `task` to run right before the next render pass.
    pub fn queue_before_render(&mut self, task: impl FnOnce() + 'static) {
        self.tasks.push_back(Box::new(task));
    }

    /// Runs every task queued so far. Returns how many ran.
    pub fn drain(&mut self) -> usize {
        let batch = std::mem::take(&mut self.tasks);
        let n = batch.len();
        for task in batch {
            task();
        }
        n
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl std::fmt::Debug for FrameTaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameTaskQueue")
            .field("pending", &self.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn drains_in_insertion_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut q = FrameTaskQueue::new();

        for i in 0..3 {
            let log = Rc::clone(&log);
            q.queue_before_render(move || log.borrow_mut().push(i));
        }

        assert_eq!(q.drain(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn each_task_runs_once() {
        let hits = Rc::new(RefCell::new(0));
        let mut q = FrameTaskQueue::new();
        {
            let hits = Rc::clone(&hits);
            q.queue_before_render(move || *hits.borrow_mut() += 1);
        }

        q.drain();
        q.drain();
        assert_eq!(*hits.borrow(), 1);
        assert!(q.is_empty());
    }
}
