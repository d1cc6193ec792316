//! Window layout: where the header, each line's row and the news strip go.
//!
//! Pure geometry so it can be tested without a window. The host feeds the
//! strip sizes back into the board as resize notifications.

use vello::kurbo::Rect;

const PADDING: f64 = 12.0;
const ROW_GAP: f64 = 6.0;
const LABEL_FRACTION: f64 = 0.28;
const HEADER_FRACTION: f64 = 0.08;
const HEADER_MIN: f64 = 40.0;
const HEADER_MAX: f64 = 96.0;
const NEWS_FRACTION: f64 = 0.09;
const NEWS_MIN: f64 = 36.0;
const NEWS_MAX: f64 = 110.0;

/// One line's row: a label column and the marquee strip next to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowLayout {
    pub label: Rect,
    pub strip: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardLayout {
    pub header: Rect,
    pub rows: Vec<RowLayout>,
    pub news: Option<Rect>,
}

/// Lay out a `width` x `height` window with `lines` rows and an optional news
/// strip along the bottom. Degenerate windows produce zero-sized rects rather
/// than negative ones.
pub fn board_layout(width: f64, height: f64, lines: usize, news: bool) -> BoardLayout {
    let width = width.max(0.0);
    let height = height.max(0.0);

    let header_height = (height * HEADER_FRACTION).clamp(HEADER_MIN, HEADER_MAX).min(height);
    let header = Rect::new(0.0, 0.0, width, header_height);

    let news_height = if news {
        (height * NEWS_FRACTION).clamp(NEWS_MIN, NEWS_MAX)
    } else {
        0.0
    };
    let news_rect = news.then(|| {
        let top = (height - news_height - PADDING).max(header_height);
        Rect::new(PADDING, top, (width - PADDING).max(PADDING), (top + news_height).min(height))
    });

    let rows_top = header_height + PADDING;
    let rows_bottom = match news_rect {
        Some(r) => r.y0 - PADDING,
        None => height - PADDING,
    };
    let available = (rows_bottom - rows_top).max(0.0);
    let row_height = if lines == 0 {
        0.0
    } else {
        ((available - ROW_GAP * (lines as f64 - 1.0)) / lines as f64).max(0.0)
    };

    let inner_width = (width - 2.0 * PADDING).max(0.0);
    let label_width = inner_width * LABEL_FRACTION;
    let strip_x0 = PADDING + label_width + ROW_GAP;
    let strip_x1 = (width - PADDING).max(strip_x0);

    let rows = (0..lines)
        .map(|i| {
            let y0 = rows_top + i as f64 * (row_height + ROW_GAP);
            let y1 = y0 + row_height;
            RowLayout {
                label: Rect::new(PADDING, y0, PADDING + label_width, y1),
                strip: Rect::new(strip_x0, y0, strip_x1, y1),
            }
        })
        .collect();

    BoardLayout {
        header,
        rows,
        news: news_rect,
    }
}
