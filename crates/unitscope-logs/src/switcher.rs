use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::filter::FilterContext;
use crate::pipe::{LogPipe, PipeError, PipeFault, PipeOptions};
use crate::pump::{DisplaySink, SinkError, pump};
use unitscope_journal::LogSource;
use unitscope_types::SelectionItem;

struct ActiveStream {
    pipe: LogPipe,
    pump: JoinHandle<Result<u64, SinkError>>,
    selection: SelectionItem,
    generation: u64,
}

/// Owns the single live pipeline behind one view.
///
/// A switch always finishes tearing down the previous pipeline and its
/// pump before the sink is cleared, so nothing from a stale stream can
/// land in the view after the new title is set.
pub struct StreamSwitcher<S: DisplaySink + Clone> {
    source: Arc<dyn LogSource>,
    sink: S,
    options: PipeOptions,
    active: Option<ActiveStream>,
    /// Bumped for every pipeline started
    generation: u64,
}

impl<S: DisplaySink + Clone> StreamSwitcher<S> {
    pub fn new(source: Arc<dyn LogSource>, sink: S, options: PipeOptions) -> Self {
        Self {
            source,
            sink,
            options,
            active: None,
            generation: 0,
        }
    }

    /// Label of the view this switcher feeds
    pub fn view(&self) -> &str {
        &self.options.view
    }

    /// Whether a pipeline is live and still following
    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(|a| !a.pipe.is_finished())
    }

    /// Whether `fault` came from the pipeline currently feeding this view.
    ///
    /// Faults from a pipeline that has since been replaced are stale.
    pub fn is_current_fault(&self, fault: &PipeFault) -> bool {
        fault.view == self.options.view
            && self
                .active
                .as_ref()
                .is_some_and(|a| a.generation == fault.generation)
    }

    /// Selection the live pipeline was built for
    pub fn current(&self) -> Option<&SelectionItem> {
        self.active.as_ref().map(|a| &a.selection)
    }

    /// Replace the live pipeline with one for `selection`.
    ///
    /// On failure the view is left without a pipeline; the sink has
    /// already been cleared and retitled.
    pub async fn switch_to(
        &mut self,
        selection: &SelectionItem,
        filter: &FilterContext,
    ) -> Result<(), PipeError> {
        self.stop().await;

        let spec = filter.match_spec(selection);
        let search = filter.search_filter()?;

        self.sink.clear();
        self.sink.set_title(&filter.title(selection));
        self.sink.scroll_to_end();

        tracing::debug!(
            view = %self.options.view,
            selection = %selection.name,
            threshold = filter.threshold.level(),
            "switching stream"
        );

        self.generation += 1;
        let options = PipeOptions {
            generation: self.generation,
            ..self.options.clone()
        };
        let mut pipe = LogPipe::start(self.source.as_ref(), spec, search, &options).await?;
        let rx = pipe.take_receiver().ok_or(PipeError::Detached)?;

        let mut sink = self.sink.clone();
        let interval = self.options.pump_interval;
        let view = self.options.view.clone();
        let pump_task = tokio::spawn(async move {
            let result = pump(rx, &mut sink, interval).await;
            if let Err(e) = &result {
                tracing::warn!(view = %view, error = %e, "display pump stopped");
            }
            result
        });

        self.active = Some(ActiveStream {
            pipe,
            pump: pump_task,
            selection: selection.clone(),
            generation: self.generation,
        });
        Ok(())
    }

    /// Cancel the live pipeline and wait until it and its pump are gone
    pub async fn stop(&mut self) {
        let Some(ActiveStream {
            mut pipe,
            pump,
            selection,
            ..
        }) = self.active.take()
        else {
            return;
        };

        pipe.cancel();
        if let Err(e) = pipe.wait().await {
            // Already reported when the reader exited
            tracing::debug!(
                view = %self.options.view,
                selection = %selection.name,
                error = %e,
                "previous pipeline had failed"
            );
        }

        match pump.await {
            Ok(Ok(bytes)) => tracing::debug!(
                view = %self.options.view,
                selection = %selection.name,
                bytes,
                "stream stopped"
            ),
            Ok(Err(_)) => {}
            Err(e) => tracing::warn!(view = %self.options.view, error = %e, "pump task failed"),
        }
    }
}
