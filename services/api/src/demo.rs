use crate::infra::{PinnedClock, RecordingNotifier};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use clap::Args;
use labour_mobility::config::WorkflowConfig;
use labour_mobility::error::AppError;
use labour_mobility::tenancy::{Role, TenantId, TenantScope, UserId};
use labour_mobility::workflows::{
    AdminDashboard, AssessmentUpdate, AttendanceUpdate, CandidateDashboard, Certificate, Cohort,
    CohortEnrollment, CohortProgress, DocumentRequest, EmployerDashboard, EnrollRequest,
    EnrollmentFilter, EnrollmentStatus, InMemoryWorkflowStore, IssueRequest, LifecycleStatus,
    NewCandidate, NewCohort, NewCourse, Notification, Placement, PlacementRequest,
    VettingApplication, VettingDecision, VettingRecord, WorkflowService,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Tenant the walkthrough runs under
    #[arg(long, default_value = "demo-tenant")]
    pub(crate) tenant: String,
    /// Replay the walkthrough as of this date (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the full JSON payloads instead of the summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DemoReport {
    tenant: TenantId,
    cohort: Cohort,
    enrollments: Vec<CohortEnrollment>,
    vetting: VettingRecord,
    certificate: Certificate,
    placement: Placement,
    cohort_progress: CohortProgress,
    admin_dashboard: AdminDashboard,
    employer_dashboard: EmployerDashboard,
    candidate_dashboard: CandidateDashboard,
    notifications: Vec<Notification>,
}

struct Cast {
    admin: TenantScope,
    recruiter: TenantScope,
    trainer: TenantScope,
    officer: TenantScope,
    employer: TenantScope,
    candidate: TenantScope,
}

impl Cast {
    fn new(tenant: &TenantId) -> Self {
        let scope = |user: &str, role| TenantScope::new(tenant.clone(), UserId(user.to_string()), role);
        Self {
            admin: scope("demo-admin", Role::Admin),
            recruiter: scope("demo-recruiter", Role::Recruiter),
            trainer: scope("demo-trainer", Role::Trainer),
            officer: scope("demo-officer", Role::VettingOfficer),
            employer: scope("demo-employer", Role::Employer),
            candidate: scope("amina.yusuf", Role::Candidate),
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let notifier = Arc::new(RecordingNotifier::default());
    let mut service = WorkflowService::new(
        Arc::new(InMemoryWorkflowStore::new()),
        notifier.clone(),
        WorkflowConfig::default(),
    );
    let today = match args.today {
        Some(date) => {
            let pinned = date.and_time(NaiveTime::MIN).and_utc();
            service = service.with_clock(Arc::new(PinnedClock(pinned)));
            date
        }
        None => Utc::now().date_naive(),
    };

    let tenant = TenantId(args.tenant);
    let report = walkthrough(&service, &notifier, &tenant, today)?;

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Demo payload unavailable: {err}"),
        }
    } else {
        render_summary(&report);
    }
    Ok(())
}

fn walkthrough(
    service: &WorkflowService<InMemoryWorkflowStore, RecordingNotifier>,
    notifier: &RecordingNotifier,
    tenant: &TenantId,
    today: NaiveDate,
) -> Result<DemoReport, AppError> {
    let cast = Cast::new(tenant);

    let course = service.create_course(
        &cast.admin,
        NewCourse {
            code: "CARE".to_string(),
            title: "Elder care assistant".to_string(),
            duration_weeks: Some(12),
        },
    )?;
    let cohort = service.create_cohort(
        &cast.admin,
        NewCohort {
            course_id: course.id,
            name: "Elder care autumn intake".to_string(),
            max_capacity: 2,
            planned_sessions: 24,
            starts_on: Some(today + Duration::days(7)),
            ends_on: Some(today + Duration::weeks(12)),
        },
    )?;
    service.publish_cohort(&cast.admin, &cohort.id)?;
    service.open_enrollment(&cast.admin, &cohort.id)?;

    let amina = service.register_candidate(
        &cast.candidate,
        NewCandidate {
            full_name: "Amina Yusuf".to_string(),
            email: "amina.yusuf@example.org".to_string(),
            phone: Some("+254700000001".to_string()),
            nationality: Some("KE".to_string()),
            user_id: None,
            recruiter_id: None,
        },
    )?;
    let joseph = service.register_candidate(
        &cast.recruiter,
        NewCandidate {
            full_name: "Joseph Mutua".to_string(),
            email: "joseph.mutua@example.org".to_string(),
            phone: None,
            nationality: Some("KE".to_string()),
            user_id: None,
            recruiter_id: None,
        },
    )?;

    let application = service.apply_to_cohort(&cast.candidate, &cohort.id)?;
    let enrollment = service.approve_application(&cast.admin, &application.id)?;
    let referral = service.enroll_candidate(
        &cast.recruiter,
        &cohort.id,
        EnrollRequest {
            candidate_id: joseph.id,
            enrollment_status: EnrollmentStatus::Applied,
        },
    )?;
    service.reject_application(
        &cast.admin,
        &referral.id,
        Some("Language certificate missing"),
    )?;

    service.close_enrollment(&cast.admin, &cohort.id)?;
    service.start_training(&cast.admin, &cohort.id)?;
    service.record_attendance(
        &cast.trainer,
        &enrollment.id,
        AttendanceUpdate {
            sessions_attended: 22,
        },
    )?;
    service.record_assessment(
        &cast.trainer,
        &enrollment.id,
        AssessmentUpdate {
            score: 88,
            passed: true,
        },
    )?;

    let vetting = service.apply_for_vetting(&cast.candidate, VettingApplication::default())?;
    service.request_documents(
        &cast.officer,
        &vetting.id,
        DocumentRequest {
            documents: vec!["passport".to_string(), "police clearance".to_string()],
            remarks: None,
        },
    )?;
    service.start_review(&cast.officer, &vetting.id)?;
    let vetting = service.clear_vetting(
        &cast.officer,
        &vetting.id,
        VettingDecision {
            remarks: Some("Documents verified".to_string()),
            reason: None,
        },
    )?;

    service.complete_enrollment(&cast.trainer, &enrollment.id)?;
    let certificate = service.issue_certificate(
        &cast.trainer,
        IssueRequest {
            enrollment_id: enrollment.id,
            override_reason: None,
            grade: Some("Distinction".to_string()),
            expiry_date: None,
        },
    )?;
    let placement = service.place_candidate(
        &cast.admin,
        &amina.id,
        PlacementRequest {
            employer_id: cast.employer.user_id().clone(),
            job_title: "Care assistant".to_string(),
        },
    )?;

    Ok(DemoReport {
        tenant: tenant.clone(),
        enrollments: service.list_enrollments(&cast.admin, &EnrollmentFilter::default())?,
        cohort_progress: service.cohort_progress(&cast.trainer, &cohort.id)?,
        cohort: service.get_cohort(&cast.admin, &cohort.id)?,
        vetting,
        certificate,
        placement,
        admin_dashboard: service.admin_dashboard(&cast.admin)?,
        employer_dashboard: service.employer_dashboard(&cast.employer)?,
        candidate_dashboard: service.candidate_dashboard(&cast.candidate)?,
        notifications: notifier.sent(),
    })
}

fn render_summary(report: &DemoReport) {
    println!("Labour mobility workflow demo ({})", report.tenant);
    println!(
        "- Cohort '{}' -> {} ({} seats, {} planned sessions)",
        report.cohort.name,
        report.cohort.status.label(),
        report.cohort.max_capacity,
        report.cohort.planned_sessions
    );
    for enrollment in &report.enrollments {
        println!(
            "  - enrollment {} -> {}{}",
            enrollment.id,
            enrollment.status.label(),
            enrollment
                .rejection_reason
                .as_deref()
                .map(|reason| format!(" ({reason})"))
                .unwrap_or_default()
        );
    }

    let progress = &report.cohort_progress;
    println!(
        "- Attendance {:.0}% | {} of {} assessed candidates passed",
        progress.attendance.attendance_rate * 100.0,
        progress.assessment.passed,
        progress.assessment.assessed
    );
    println!(
        "- Vetting {} -> {}",
        report.vetting.id,
        report.vetting.status.label()
    );
    println!(
        "- Certificate {} issued {} ({})",
        report.certificate.certificate_number,
        report.certificate.issue_date.date_naive(),
        report.certificate.grade.as_deref().unwrap_or("ungraded")
    );
    println!(
        "- Placed as '{}' with {}",
        report.placement.job_title, report.placement.employer_id
    );
    println!(
        "- Admin view: {} pending applications | {} certificates and {} hires in the last {} days",
        report.admin_dashboard.pending_applications,
        report.admin_dashboard.certificates_issued_in_window,
        report.admin_dashboard.hires_in_window,
        report.admin_dashboard.window_days
    );
    println!(
        "- Candidate view: {} enrollments | {} certificates",
        report.candidate_dashboard.enrollments.len(),
        report.candidate_dashboard.certificates.len()
    );

    if report.notifications.is_empty() {
        println!("Notifications: none dispatched");
    } else {
        println!("Notifications:");
        for notification in &report.notifications {
            println!(
                "  - template={} -> {}",
                notification.template.label(),
                notification.candidate_id
            );
        }
    }
}
