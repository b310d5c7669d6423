//! Scroll simulation
//!
//! Lays a page description out as a vertical stack of sections, attaches
//! every section (or every list item) to a [`RevealCoordinator`] and scrolls
//! a viewport from the top of the page to the bottom, one step per frame.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};
use unveil_animation::CountUp;
use unveil_core::{ElementRef, ElementSlot, Rect};
use unveil_reveal::{ObservedId, RevealConfig, RevealCoordinator, RevealHandle, RevealState};

use crate::config::{PageConfig, SectionConfig};

/// Space above a section's items for its heading
const SECTION_HEADER: f32 = 80.0;

/// Gap between list items
const ITEM_GAP: f32 = 24.0;

/// Longest scroll a simulation will run
const MAX_SCROLL_FRAMES: u64 = 1_000_000;

#[derive(Clone, Copy, Debug)]
pub struct SimulationOptions {
    pub viewport_height: f32,
    pub scroll_step: f32,
    pub frame_ms: u64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            viewport_height: 800.0,
            scroll_step: 40.0,
            frame_ms: 16,
        }
    }
}

// =============================================================================
// Layout
// =============================================================================

/// One revealed element placed on the page
#[derive(Clone, Debug)]
pub struct PlacedElement {
    pub element: ElementRef,
    pub rect: Rect,
    pub section: usize,
    pub index: usize,
    pub label: String,
}

/// Stack sections top to bottom and grid each section's items
pub fn layout(page: &PageConfig) -> Vec<PlacedElement> {
    let width = page.page.width;
    let mut placed = Vec::new();
    let mut y = 0.0;
    let mut next_element = 1u64;

    for (section_index, section) in page.sections.iter().enumerate() {
        if section.is_list() {
            for (index, rect) in item_rects(section, width, y).into_iter().enumerate() {
                placed.push(PlacedElement {
                    element: ElementRef::new(next_element),
                    rect,
                    section: section_index,
                    index,
                    label: format!("{}[{}]", section.id, index),
                });
                next_element += 1;
            }
        } else {
            placed.push(PlacedElement {
                element: ElementRef::new(next_element),
                rect: Rect::new(0.0, y, width, section.height),
                section: section_index,
                index: 0,
                label: section.id.clone(),
            });
            next_element += 1;
        }
        y += section.height;
    }

    placed
}

fn item_rects(section: &SectionConfig, width: f32, top: f32) -> Vec<Rect> {
    let count = section.element_count();
    let columns = section.columns.max(1);
    let rows = count.div_ceil(columns).max(1);

    let item_width = ((width - ITEM_GAP * (columns - 1) as f32) / columns as f32).max(1.0);
    let item_height = section.item_height.unwrap_or_else(|| {
        let available = section.height - SECTION_HEADER - ITEM_GAP * (rows - 1) as f32;
        (available / rows as f32).max(1.0)
    });

    (0..count)
        .map(|i| {
            let row = i / columns;
            let col = i % columns;
            Rect::new(
                col as f32 * (item_width + ITEM_GAP),
                top + SECTION_HEADER + row as f32 * (item_height + ITEM_GAP),
                item_width,
                item_height,
            )
        })
        .collect()
}

// =============================================================================
// Report
// =============================================================================

/// A reveal transition observed during the run
#[derive(Clone, Debug)]
pub struct RevealRecord {
    pub at: Duration,
    pub section: usize,
    pub label: String,
    pub from: RevealState,
    pub to: RevealState,
}

#[derive(Clone, Debug)]
pub struct SectionReport {
    pub id: String,
    pub elements: usize,
    pub revealed: usize,
    pub first_reveal: Option<Duration>,
    pub last_reveal: Option<Duration>,
    /// Items fully drawn when scrolling ended
    pub settled: usize,
    /// Counter values when scrolling ended
    pub counters: Vec<u64>,
}

#[derive(Clone, Debug)]
pub struct SimulationReport {
    pub page: String,
    pub frames: usize,
    pub scroll_end: Duration,
    pub finished: Duration,
    pub observers: usize,
    pub sections: Vec<SectionReport>,
    pub records: Vec<RevealRecord>,
}

impl SimulationReport {
    pub fn revealed(&self) -> usize {
        self.sections.iter().map(|s| s.revealed).sum()
    }

    pub fn elements(&self) -> usize {
        self.sections.iter().map(|s| s.elements).sum()
    }
}

// =============================================================================
// Run
// =============================================================================

struct Attached {
    placed: PlacedElement,
    handle: RevealHandle,
}

pub fn simulate(page: &PageConfig, options: &SimulationOptions) -> Result<SimulationReport> {
    if !options.scroll_step.is_finite() || options.scroll_step <= 0.0 {
        anyhow::bail!("scroll step must be positive, got {}", options.scroll_step);
    }
    if options.viewport_height <= 0.0 {
        anyhow::bail!(
            "viewport height must be positive, got {}",
            options.viewport_height
        );
    }

    let configs = page
        .sections
        .iter()
        .map(|section| {
            section
                .reveal_config(&page.defaults)
                .with_context(|| format!("Invalid reveal config in section '{}'", section.id))
        })
        .collect::<Result<Vec<RevealConfig>>>()?;

    let coordinator = RevealCoordinator::new();
    let placed = layout(page);
    let bounds: FxHashMap<ElementRef, Rect> =
        placed.iter().map(|p| (p.element, p.rect)).collect();

    let mut attached = Vec::with_capacity(placed.len());
    let mut labels: FxHashMap<ObservedId, (usize, String)> = FxHashMap::default();
    for p in placed {
        let section = &page.sections[p.section];
        let slot = ElementSlot::filled(p.element);
        let handle = if section.is_list() {
            coordinator.attach_item(&slot, &configs[p.section], p.index, section.element_count())
        } else {
            coordinator.attach(&slot, &configs[p.section])
        };
        if let Some(id) = coordinator.observed_id(&handle) {
            labels.insert(id, (p.section, p.label.clone()));
        }
        attached.push(Attached { placed: p, handle });
    }

    debug!(
        "attached {} elements on {} observers",
        attached.len(),
        coordinator.observer_count()
    );

    let clock = Rc::new(Cell::new(Duration::ZERO));
    let records = Rc::new(RefCell::new(Vec::new()));
    {
        let clock = clock.clone();
        let records = records.clone();
        coordinator.subscribe(move |t| {
            let Some((section, label)) = labels.get(&t.id) else {
                return;
            };
            let at = clock.get();
            if t.to == RevealState::Revealed {
                info!("{:>7}ms  {} revealed", at.as_millis(), label);
            }
            records.borrow_mut().push(RevealRecord {
                at,
                section: *section,
                label: label.clone(),
                from: t.from,
                to: t.to,
            });
        });
    }

    // Scroll from top to bottom
    let frame = Duration::from_millis(options.frame_ms);
    let max_scroll = (page.total_height() - options.viewport_height).max(0.0);
    let step = f64::from(options.scroll_step);
    let scroll_frames = (f64::from(max_scroll) / step).ceil() as u64;
    if scroll_frames > MAX_SCROLL_FRAMES {
        anyhow::bail!(
            "scrolling {}px in {}px steps takes {} frames, more than {}",
            max_scroll,
            options.scroll_step,
            scroll_frames,
            MAX_SCROLL_FRAMES
        );
    }

    // Positions are derived from the frame index so small steps never stall
    let mut now = Duration::ZERO;
    let mut frames = 0;
    for frame_index in 0..=scroll_frames {
        if frame_index > 0 {
            now += frame;
        }
        let scroll_y = (frame_index as f64 * step).min(f64::from(max_scroll)) as f32;

        clock.set(now);
        let viewport = Rect::new(0.0, scroll_y, page.page.width, options.viewport_height);
        coordinator.update(viewport, &bounds, now);
        frames += 1;
    }
    let scroll_end = now;

    // Let pending cascades finish
    while let Some(due) = coordinator.next_reveal_due() {
        let due = due.max(now);
        clock.set(due);
        coordinator.advance(due);
        now = due;
    }

    let records = records.borrow().clone();
    let sections = page
        .sections
        .iter()
        .enumerate()
        .map(|(index, section)| {
            section_report(index, section, &attached, &records, &coordinator, scroll_end)
        })
        .collect();

    Ok(SimulationReport {
        page: page.page.name.clone(),
        frames,
        scroll_end,
        finished: now,
        observers: coordinator.observer_count(),
        sections,
        records,
    })
}

fn section_report(
    index: usize,
    section: &SectionConfig,
    attached: &[Attached],
    records: &[RevealRecord],
    coordinator: &RevealCoordinator,
    scroll_end: Duration,
) -> SectionReport {
    let reveals: Vec<Duration> = records
        .iter()
        .filter(|r| r.section == index && r.to == RevealState::Revealed)
        .map(|r| r.at)
        .collect();

    let items: Vec<&Attached> = attached
        .iter()
        .filter(|a| a.placed.section == index)
        .collect();

    let settled = items
        .iter()
        .filter(|a| {
            coordinator.state_of(&a.handle) == Some(RevealState::Revealed)
                && coordinator.visual_frame(&a.handle, scroll_end).is_identity()
        })
        .count();

    let counters = section
        .count_to
        .iter()
        .enumerate()
        .map(|(i, &to)| {
            let revealed_at = records
                .iter()
                .find(|r| {
                    r.section == index
                        && r.to == RevealState::Revealed
                        && r.label == format!("{}[{}]", section.id, i)
                })
                .map(|r| r.at);
            match revealed_at {
                Some(at) if at <= scroll_end => {
                    let elapsed = scroll_end.saturating_sub(at).as_millis() as u64;
                    CountUp::new(to).value_at(elapsed)
                }
                _ => 0,
            }
        })
        .collect();

    SectionReport {
        id: section.id.clone(),
        elements: items.len(),
        revealed: reveals.len(),
        first_reveal: reveals.iter().min().copied(),
        last_reveal: reveals.iter().max().copied(),
        settled,
        counters,
    }
}
