// 该文件是 Mingmu （明目） 项目的一部分。
// src/content.rs - 眼健康科普页面与筛查问卷
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::fmt;

use clap::ValueEnum;

/// 静态科普页面
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Page {
  Home,
  Diseases,
  Prevention,
  Symptoms,
  Statistics,
}

impl Page {
  pub const ALL: [Page; 5] = [
    Page::Home,
    Page::Diseases,
    Page::Prevention,
    Page::Symptoms,
    Page::Statistics,
  ];

  pub fn title(&self) -> &'static str {
    match self {
      Page::Home => "Welcome to the Eye Disease Information Center",
      Page::Diseases => "Common Eye Diseases",
      Page::Prevention => "Prevention Tips",
      Page::Symptoms => "Eye Disease Symptoms",
      Page::Statistics => "Some statistics on eye diseases",
    }
  }

  pub fn intro(&self) -> &'static str {
    match self {
      Page::Home => {
        "This page provides information on common eye diseases, prevention tips, and what to do if you experience symptoms."
      }
      Page::Diseases => "Here are some common eye diseases:",
      Page::Prevention => "To maintain good eye health, consider the following tips:",
      Page::Symptoms => {
        "If you experience any of the following symptoms, consult an eye specialist:"
      }
      Page::Statistics => {
        "In 2019 the WHO produced its first World Report on Vision, here is what it revealed:"
      }
    }
  }

  pub fn items(&self) -> &'static [&'static str] {
    match self {
      Page::Home => &[],
      Page::Diseases => &DISEASES,
      Page::Prevention => &PREVENTION_TIPS,
      Page::Symptoms => &SYMPTOMS,
      Page::Statistics => &STATISTICS,
    }
  }

  /// 预防建议为有序列表，其余页面为无序列表
  pub fn is_numbered(&self) -> bool {
    matches!(self, Page::Prevention)
  }
}

impl fmt::Display for Page {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", self.title())?;
    writeln!(f)?;
    writeln!(f, "{}", self.intro())?;
    for (index, item) in self.items().iter().enumerate() {
      if self.is_numbered() {
        writeln!(f, "{}. {}", index + 1, item)?;
      } else {
        writeln!(f, "- {}", item)?;
      }
    }
    Ok(())
  }
}

const DISEASES: [&str; 18] = [
  "Age-Related Macular Degeneration (ARMD)",
  "Glaucoma",
  "Cataracts",
  "Dry eye",
  "Coloboma of the optic disc",
  "Age-related macular degeneration",
  "Branch retinal vein occlusion",
  "Optic disc pits",
  "Central retinal vein occlusion",
  "Choroidal neovascularization",
  "Retinitis pigmentosa",
  "Central serous retinopathy",
  "Hypertension retinopathy",
  "Presence of media haze",
  "Presence of tessellation",
  "Presence of drusen",
  "Presence of myopia",
  "Optic disc edema",
];

const PREVENTION_TIPS: [&str; 17] = [
  "Eat a diet rich in fruits and vegetables.",
  "Protect your eyes from UV rays with sunglasses.",
  "Maintain a healthy lifestyle with regular exercise.",
  "Stay hydrated: Drink an adequate amount of water daily to help prevent dry eyes.",
  "Follow the 20-20-20 Rule: Take a 20-second break every 20 minutes of screen time and look at something 20 feet away.",
  "Schedule regular eye check-ups with an eye specialist or optometrist to catch and address any issues early.",
  "Use protective eyewear when engaging in activities that could lead to eye injuries.",
  "Reduce prolonged exposure to digital screens and adjust screen settings to reduce eye strain.",
  "Consume foods rich in eye-healthy nutrients.",
  "Quit smoking to reduce the risk of eye diseases.",
  "Ensure proper lighting when reading or working to reduce eye strain.",
  "Control underlying health conditions like diabetes and hypertension.",
  "Wear protective eyewear in environments with potential eye hazards.",
  "Shield your eyes from harmful UV rays by wearing UV-blocking sunglasses.",
  "Moderate alcohol intake, as excessive consumption can lead to eye issues.",
  "Stay active and engage in regular exercise to improve blood circulation to the eyes.",
  "Avoid excessive eye rubbing to prevent introducing dirt and bacteria.",
];

const SYMPTOMS: [&str; 16] = [
  "Blurry vision",
  "Eye pain or discomfort",
  "Redness or irritation",
  "Excessive tearing or discharge",
  "Sensitivity to light (photophobia)",
  "Double vision",
  "Seeing halos around lights",
  "Floating spots or specks in your vision",
  "Gradual loss of peripheral vision",
  "Sudden loss of vision in one or both eyes",
  "Changes in the color of the iris",
  "Crossed or misaligned eyes (strabismus)",
  "Persistent eye fatigue or strain",
  "Persistent itching or burning sensation",
  "Frequent changes in eyeglass or contact lens prescriptions",
  "Unexplained changes in the appearance of the eyes or eyelids",
];

const STATISTICS: [&str; 10] = [
  "More than a Billion People Affected: At least 2.2 billion people are affected by visual impairment or blindness, among these cases more than a billion could have been avoided or are still not treated",
  "Common Conditions: Eye conditions and vision disorders, such as cataracts, trachoma, and refractive errors, are widespread, but often untreated.",
  "Unequal Distribution: The burden of eye conditions and visual impairment is not distributed equitably. Rural, low-income, women, older people, people with disabilities, ethnic minorities and indigenous populations are most affected.",
  "Unmet need for correction: In low- and middle-income areas, unmet need for distance vision correction is four times higher than in high-income areas.",
  "Increasing Blindness: In some low- and middle-income regions in sub-Saharan Africa and South Asia, the rate of blindness is eight times higher than in high-income countries.",
  "Funding Need: It is estimated that approximately $14.3 billion is needed to treat one billion people with visual impairments due to myopia, presbyopia or cataracts.",
  "Growth Factors: Population growth and the aging of the population increase the risk of developing eye disorders and visual impairment. The prevalence increases with age.",
  "Myopia: Reduced time spent outdoors and increased near vision activities increase the number of people with myopia.",
  "Diabetic Retinopathy: Diabetes, particularly type 2, can impact vision. Almost all diabetics will develop retinopathy at some point in their life.",
  "Late Detection: Due to lack of integration of eye care services, many people do not have access to regular examinations for early detection of diseases and appropriate treatment.",
];

/// 问卷：上一次眼底筛查距今多久
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LastCheckup {
  LessThanSixMonths,
  SixMonthsToYear,
  OverAYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceLevel {
  Success,
  Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckupAdvice {
  pub level: AdviceLevel,
  pub message: &'static str,
  pub follow_up: Option<&'static str>,
}

impl LastCheckup {
  pub const QUESTION: &'static str = "When was your last eye screening?";

  pub fn label(&self) -> &'static str {
    match self {
      LastCheckup::LessThanSixMonths => "Less than 6 months ago",
      LastCheckup::SixMonthsToYear => "Between 6 months and 1 year ago",
      LastCheckup::OverAYear => "Over a year ago",
    }
  }

  pub fn advice(&self) -> CheckupAdvice {
    match self {
      LastCheckup::LessThanSixMonths => CheckupAdvice {
        level: AdviceLevel::Success,
        message: "Congratulations! You had a recent eye screening.",
        follow_up: None,
      },
      LastCheckup::SixMonthsToYear => CheckupAdvice {
        level: AdviceLevel::Warning,
        message: "It's recommended to have regular eye screenings to maintain good eye health.",
        follow_up: Some("In the meantime, you can use our AI to check the condition of your eyes."),
      },
      LastCheckup::OverAYear => CheckupAdvice {
        level: AdviceLevel::Warning,
        message: "It's important to schedule an eye screening soon to maintain good eye health.",
        follow_up: Some("You can also use our AI to check the condition of your eyes."),
      },
    }
  }
}
