//! Common test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use kudumbam::models::{Household, Member};
use kudumbam::render::{BrowserProvisioner, BrowserSession, PdfOptions, RenderError, RenderResult};

/// Bytes every successful fake render returns
pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n%fake\n";

/// Reference date used for derived ages
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Household with a head and one other member, Malayalam filled in
pub fn create_test_household(house_number: &str) -> Household {
    let mut household = Household::new(house_number, "Church Road, Kottayam");
    household.address_ml = "പള്ളി റോഡ്, കോട്ടയം".to_string();
    household.phone = "+91 481 2345678".to_string();
    household.members.push(Member {
        name_ml: "ജോസഫ്".to_string(),
        relationship_en: "Head".to_string(),
        relationship_ml: "ഗൃഹനാഥൻ".to_string(),
        occupation_en: "Teacher".to_string(),
        occupation_ml: "അധ്യാപകൻ".to_string(),
        age: Some(52),
        ..Member::head("Joseph")
    });
    household.members.push(Member {
        name_ml: "മേരി".to_string(),
        relationship_en: "Wife".to_string(),
        relationship_ml: "ഭാര്യ".to_string(),
        dob: NaiveDate::from_ymd_opt(1975, 8, 15),
        ..Member::new("Mary")
    });
    household
}

/// `count` households numbered from 1
pub fn create_test_households(count: usize) -> Vec<Household> {
    (1..=count)
        .map(|i| create_test_household(&i.to_string()))
        .collect()
}

// ============================================================================
// Fake browser
// ============================================================================

/// What a fake session does when asked to render
#[derive(Debug, Clone, Copy)]
pub enum FakeBehavior {
    /// Return [`FAKE_PDF`]
    Succeed,
    /// Fail while loading the document
    FailLoad,
    /// Never finish
    Hang,
}

/// Provisioner that counts sessions instead of starting a browser
#[derive(Clone)]
pub struct FakeProvisioner {
    behavior: FakeBehavior,
    pub acquired: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub last_html: Arc<std::sync::Mutex<Option<String>>>,
}

impl FakeProvisioner {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            acquired: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            last_html: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn last_html(&self) -> Option<String> {
        self.last_html.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserProvisioner for FakeProvisioner {
    fn name(&self) -> &str {
        "fake"
    }

    async fn acquire(&self) -> RenderResult<Box<dyn BrowserSession>> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            behavior: self.behavior,
            closed: self.closed.clone(),
            last_html: self.last_html.clone(),
        }))
    }
}

struct FakeSession {
    behavior: FakeBehavior,
    closed: Arc<AtomicUsize>,
    last_html: Arc<std::sync::Mutex<Option<String>>>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn render_pdf(&mut self, html: &str, _options: &PdfOptions) -> RenderResult<Vec<u8>> {
        *self.last_html.lock().unwrap() = Some(html.to_string());
        match self.behavior {
            FakeBehavior::Succeed => Ok(FAKE_PDF.to_vec()),
            FakeBehavior::FailLoad => Err(RenderError::load("simulated navigation failure")),
            FakeBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn close(self: Box<Self>) -> RenderResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
